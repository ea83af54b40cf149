use super::features::FeaturePipeline;
use super::metrics::TaskMetrics;
use super::models::FittedModel;
use crate::domain::ml::feature_registry::SchemaDescriptor;
use crate::domain::ml::tasks::{Algorithm, PredictionTask};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version of the persisted bundle layout.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// A fitted model plus everything needed to rebuild its inputs.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModelArtifact {
    pub task: PredictionTask,
    pub algorithm: Algorithm,
    pub schema: SchemaDescriptor,
    pub pipeline: FeaturePipeline,
    pub model: FittedModel,
    pub metrics: TaskMetrics,
    pub train_samples: usize,
    pub test_samples: usize,
    pub trained_at: DateTime<Utc>,
}

/// The persisted set of trained models, replaced wholesale on retraining.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub demand: Option<TrainedModelArtifact>,
    pub price: Option<TrainedModelArtifact>,
    pub cancellation: Option<TrainedModelArtifact>,
}

impl Default for ArtifactBundle {
    fn default() -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            created_at: Utc::now(),
            demand: None,
            price: None,
            cancellation: None,
        }
    }
}

impl ArtifactBundle {
    pub fn get(&self, task: PredictionTask) -> Option<&TrainedModelArtifact> {
        match task {
            PredictionTask::Demand => self.demand.as_ref(),
            PredictionTask::Price => self.price.as_ref(),
            PredictionTask::Cancellation => self.cancellation.as_ref(),
        }
    }

    /// Stores an artifact in the slot of its own task.
    pub fn insert(&mut self, artifact: TrainedModelArtifact) {
        match artifact.task {
            PredictionTask::Demand => self.demand = Some(artifact),
            PredictionTask::Price => self.price = Some(artifact),
            PredictionTask::Cancellation => self.cancellation = Some(artifact),
        }
    }

    pub fn is_complete(&self) -> bool {
        PredictionTask::ALL.iter().all(|task| self.get(*task).is_some())
    }

    pub fn trained_tasks(&self) -> Vec<PredictionTask> {
        PredictionTask::ALL
            .into_iter()
            .filter(|task| self.get(*task).is_some())
            .collect()
    }
}

/// Persistence of the artifact bundle.
pub trait ArtifactStore: Send + Sync {
    fn save(&self, bundle: &ArtifactBundle) -> Result<()>;

    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<ArtifactBundle>>;
}
