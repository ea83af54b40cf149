//! Training orchestration for the demand, price and cancellation tasks.

use super::artifacts::TrainedModelArtifact;
use super::features::FeaturePipeline;
use super::metrics::{ClassificationMetrics, RegressionMetrics, TaskMetrics};
use super::models::{FittedModel, TreeParameters, to_matrix};
use crate::domain::errors::TrainingError;
use crate::domain::ml::feature_registry::FeatureSchema;
use crate::domain::ml::tasks::{Algorithm, PredictionTask};
use crate::domain::records::CanonicalBookingRecord;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Smallest dataset that still leaves a non-empty train and test split.
pub const MIN_TRAINING_SAMPLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub trees: TreeParameters,
    pub split_seed: u64,
    pub test_fraction: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            trees: TreeParameters::default(),
            split_seed: 42,
            test_fraction: 0.2,
        }
    }
}

/// Algorithm name per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingPlan {
    pub demand: String,
    pub price: String,
    pub cancellation: String,
}

impl Default for TrainingPlan {
    fn default() -> Self {
        Self {
            demand: "random_forest".to_string(),
            price: "random_forest".to_string(),
            cancellation: "random_forest".to_string(),
        }
    }
}

impl TrainingPlan {
    pub fn algorithm_for(&self, task: PredictionTask) -> &str {
        match task {
            PredictionTask::Demand => &self.demand,
            PredictionTask::Price => &self.price,
            PredictionTask::Cancellation => &self.cancellation,
        }
    }
}

/// Structured result of one training run, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task: PredictionTask,
    pub algorithm: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TaskMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskOutcome {
    pub fn from_result(
        task: PredictionTask,
        algorithm: &str,
        result: &Result<TrainedModelArtifact, TrainingError>,
    ) -> Self {
        match result {
            Ok(artifact) => Self {
                task,
                algorithm: algorithm.to_string(),
                success: true,
                metrics: Some(artifact.metrics.clone()),
                error: None,
            },
            Err(e) => Self {
                task,
                algorithm: algorithm.to_string(),
                success: false,
                metrics: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Label a record contributes to a task.
pub fn target(task: PredictionTask, record: &CanonicalBookingRecord) -> f64 {
    match task {
        PredictionTask::Demand => f64::from(record.actual_bookings()),
        PredictionTask::Price => record.optimized_price(),
        PredictionTask::Cancellation => {
            if record.was_cancelled() {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Ensures a binary label vector contains both classes.
///
/// When only one class is present, the first `max(1, n / 10)` labels are
/// switched to the missing class. Returns how many labels were changed.
pub fn ensure_two_classes(labels: &mut [f64]) -> usize {
    let Some(first) = labels.first().copied() else {
        return 0;
    };
    if labels.iter().any(|l| *l != first) {
        return 0;
    }
    let flips = (labels.len() / 10).max(1);
    let missing = if first >= 0.5 { 0.0 } else { 1.0 };
    for label in labels.iter_mut().take(flips) {
        *label = missing;
    }
    flips
}

pub struct ModelTrainer {
    settings: ModelSettings,
}

impl ModelTrainer {
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Deterministic shuffled split into (train, test) index sets.
    fn split_indices(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.settings.split_seed);
        indices.shuffle(&mut rng);
        let test_len = ((n as f64) * self.settings.test_fraction)
            .ceil()
            .clamp(1.0, (n - 1) as f64) as usize;
        let test = indices[..test_len].to_vec();
        let train = indices[test_len..].to_vec();
        (train, test)
    }

    /// Fits `algorithm_name` for `task` on `records` and evaluates it on a held-out split.
    pub fn train(
        &self,
        task: PredictionTask,
        records: &[CanonicalBookingRecord],
        algorithm_name: &str,
    ) -> Result<TrainedModelArtifact, TrainingError> {
        let algorithm = Algorithm::from_name(algorithm_name)
            .filter(|a| task.supports(*a))
            .ok_or_else(|| TrainingError::UnsupportedAlgorithm {
                task,
                algorithm: algorithm_name.to_string(),
            })?;

        if records.len() < MIN_TRAINING_SAMPLES {
            return Err(TrainingError::InsufficientData {
                task,
                samples: records.len(),
                required: MIN_TRAINING_SAMPLES,
            });
        }

        let (train_idx, test_idx) = self.split_indices(records.len());
        let train_records: Vec<&CanonicalBookingRecord> =
            train_idx.iter().map(|&i| &records[i]).collect();
        let test_records: Vec<&CanonicalBookingRecord> =
            test_idx.iter().map(|&i| &records[i]).collect();

        let mut y_train: Vec<f64> = train_records.iter().map(|r| target(task, r)).collect();
        let y_test: Vec<f64> = test_records.iter().map(|r| target(task, r)).collect();

        if task.is_classification() {
            let flipped = ensure_two_classes(&mut y_train);
            if flipped > 0 {
                warn!(
                    "Only one cancellation class in {} training samples; flipped {} labels to fit a classifier",
                    y_train.len(),
                    flipped
                );
            }
        }

        let schema = FeatureSchema::for_task(task);
        let pipeline = FeaturePipeline::fit(&schema, &train_records);
        let x_train: Vec<Vec<f64>> = train_records
            .iter()
            .map(|r| pipeline.transform(*r))
            .collect();
        let x_test: Vec<Vec<f64>> = test_records
            .iter()
            .map(|r| pipeline.transform(*r))
            .collect();

        let model_error = |reason: String| TrainingError::Model { task, reason };
        let x_train_m = to_matrix(&x_train).map_err(model_error)?;
        let x_test_m = to_matrix(&x_test).map_err(model_error)?;

        info!(
            "Training {} model ({}) on {} samples, evaluating on {}",
            task,
            algorithm,
            x_train.len(),
            x_test.len()
        );
        let model = FittedModel::fit(algorithm, &x_train_m, &y_train, &self.settings.trees)
            .map_err(model_error)?;
        let predictions = model.predict(&x_test_m).map_err(model_error)?;

        let metrics = if task.is_classification() {
            let predicted: Vec<u8> = predictions
                .iter()
                .map(|p| u8::from(p.clamp(0.0, 1.0) >= 0.5))
                .collect();
            let actual: Vec<u8> = y_test.iter().map(|y| u8::from(*y >= 0.5)).collect();
            let report = ClassificationMetrics::evaluate(&predicted, &actual);
            info!(
                "{} model: accuracy={:.4}, weighted F1={:.4}",
                task, report.accuracy, report.weighted_avg.f1
            );
            TaskMetrics::Classification(report)
        } else {
            let report = RegressionMetrics::evaluate(&predictions, &y_test);
            info!(
                "{} model: RMSE={:.4}, MAE={:.4}, R²={:.4}",
                task, report.rmse, report.mae, report.r2
            );
            TaskMetrics::Regression(report)
        };

        Ok(TrainedModelArtifact {
            task,
            algorithm,
            schema: schema.descriptor(),
            pipeline,
            model,
            metrics,
            train_samples: x_train.len(),
            test_samples: x_test.len(),
            trained_at: Utc::now(),
        })
    }
}
