//! Storage locations parsing from environment variables.

use std::env;
use std::path::PathBuf;

/// Storage environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEnvConfig {
    pub database_url: String,
    pub artifact_path: PathBuf,
    /// Previous model bundles kept as backups (0 = none)
    pub artifact_keep_versions: usize,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/surfcast.db".to_string(),
            artifact_path: PathBuf::from("data/ml/booking_models.json"),
            artifact_keep_versions: 0,
        }
    }
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/surfcast.db".to_string()),
            artifact_path: env::var("ARTIFACT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/ml/booking_models.json")),
            artifact_keep_versions: env::var("ARTIFACT_KEEP_VERSIONS")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<usize>()
                .unwrap_or(0),
        }
    }
}
