//! Configuration module for surfcast.
//!
//! Settings are loaded from environment variables, grouped by concern:
//! pipeline runs, model training and storage. Per-task algorithm choices
//! come from an optional TOML training plan.

mod model_config;
mod pipeline_config;
mod storage_config;

pub use model_config::ModelEnvConfig;
pub use pipeline_config::PipelineEnvConfig;
pub use storage_config::StorageEnvConfig;

use crate::application::ml::TrainingPlan;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub pipeline: PipelineEnvConfig,
    pub model: ModelEnvConfig,
    pub storage: StorageEnvConfig,
    pub training_plan: TrainingPlan,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let pipeline = PipelineEnvConfig::from_env();
        let model = ModelEnvConfig::from_env().context("Failed to load model config")?;
        let storage = StorageEnvConfig::from_env();

        let training_plan = match env::var("TRAINING_PLAN_PATH") {
            Ok(path) => load_training_plan(&PathBuf::from(path))?,
            Err(_) => TrainingPlan::default(),
        };

        Ok(Self {
            pipeline,
            model,
            storage,
            training_plan,
        })
    }
}

/// Reads a training plan such as:
///
/// ```toml
/// demand = "linear"
/// price = "random_forest"
/// cancellation = "logistic"
/// ```
///
/// Tasks left out keep the default algorithm.
pub fn load_training_plan(path: &Path) -> Result<TrainingPlan> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read training plan {:?}", path))?;
    let plan = parse_training_plan(&content)
        .with_context(|| format!("Failed to parse training plan {:?}", path))?;
    info!("Loaded training plan from {:?}: {:?}", path, plan);
    Ok(plan)
}

pub fn parse_training_plan(content: &str) -> Result<TrainingPlan> {
    Ok(toml::from_str(content)?)
}
