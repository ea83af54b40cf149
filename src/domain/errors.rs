use crate::domain::ml::tasks::PredictionTask;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by the extract-transform-load stages
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No data: {reason}")]
    NoData { reason: String },

    #[error("Extraction of {kind} records failed: {reason}")]
    Extraction { kind: String, reason: String },

    #[error("Training failed for: {tasks}")]
    Training { tasks: String },

    #[error("Failed to persist model artifacts: {reason}")]
    Persistence { reason: String },
}

/// Errors returned by a training run
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Unsupported algorithm '{algorithm}' for {task} task")]
    UnsupportedAlgorithm {
        task: PredictionTask,
        algorithm: String,
    },

    #[error("Insufficient data for {task} task: {samples} samples, need at least {required}")]
    InsufficientData {
        task: PredictionTask,
        samples: usize,
        required: usize,
    },

    #[error("Model fitting failed for {task} task: {reason}")]
    Model { task: PredictionTask, reason: String },
}

/// Errors returned by the prediction service
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("No trained {task} model loaded")]
    ModelNotTrained { task: PredictionTask },

    #[error("Feature schema mismatch for {task} model: artifact has {found}, expected {expected}")]
    SchemaMismatch {
        task: PredictionTask,
        expected: String,
        found: String,
    },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Prediction failed for {task} model: {reason}")]
    Model { task: PredictionTask, reason: String },
}

/// Non-blocking data quality findings, logged as warnings
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    #[error("Column '{column}' has {count} missing values")]
    MissingValues { column: String, count: usize },

    #[error("Column '{column}' has high cardinality: {distinct} distinct values")]
    HighCardinality { column: String, distinct: usize },

    #[error("{count} records have negative actual_bookings")]
    NegativeBookings { count: usize },
}
