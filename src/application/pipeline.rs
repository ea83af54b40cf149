//! Full batch run: extract, transform, load, then train and persist all models.

use crate::application::etl::{Extractor, TrainingDataset, Transformer};
use crate::application::ml::{
    ArtifactBundle, ArtifactStore, ModelTrainer, TaskOutcome, TrainingPlan,
};
use crate::domain::errors::PipelineError;
use crate::domain::ml::tasks::PredictionTask;
use crate::domain::records::{CanonicalBookingRecord, DateRange, SourceKind};
use crate::infrastructure::observability::PipelineMetrics;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub raw_records: usize,
    pub transformed_records: usize,
    pub dropped_records: usize,
    pub weather_fallbacks: usize,
    /// Length of the lookback window, not the number of distinct dates seen.
    pub days_covered: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub success: bool,
    pub stats: PipelineStats,
    pub training_results: Vec<TaskOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineReport {
    pub fn from_result(stats: PipelineStats, result: Result<Vec<TaskOutcome>, PipelineFailure>) -> Self {
        match result {
            Ok(training_results) => Self {
                success: true,
                stats,
                training_results,
                error: None,
            },
            Err(failure) => {
                error!("Pipeline run failed: {}", failure.error);
                Self {
                    success: false,
                    stats,
                    training_results: failure.training_results,
                    error: Some(failure.error.to_string()),
                }
            }
        }
    }
}

/// A failed run, with whatever training results were produced before it failed.
#[derive(Debug)]
pub struct PipelineFailure {
    pub error: PipelineError,
    pub training_results: Vec<TaskOutcome>,
}

impl From<PipelineError> for PipelineFailure {
    fn from(error: PipelineError) -> Self {
        Self {
            error,
            training_results: Vec::new(),
        }
    }
}

/// Models trained in one pass over a dataset.
#[derive(Debug)]
pub struct TrainingRun {
    pub outcomes: Vec<TaskOutcome>,
    /// Present only when every task trained successfully.
    pub bundle: Option<ArtifactBundle>,
}

/// Trains demand, price and cancellation models one after another.
pub fn train_all(
    trainer: &ModelTrainer,
    plan: &TrainingPlan,
    records: &[CanonicalBookingRecord],
) -> TrainingRun {
    let mut bundle = ArtifactBundle::default();
    let mut outcomes = Vec::with_capacity(PredictionTask::ALL.len());

    for task in PredictionTask::ALL {
        let algorithm = plan.algorithm_for(task);
        let result = trainer.train(task, records, algorithm);
        outcomes.push(TaskOutcome::from_result(task, algorithm, &result));
        match result {
            Ok(artifact) => bundle.insert(artifact),
            Err(e) => warn!("Training {} model failed: {}", task, e),
        }
    }

    let bundle = if bundle.is_complete() {
        bundle.created_at = Utc::now();
        Some(bundle)
    } else {
        None
    };
    TrainingRun { outcomes, bundle }
}

/// Trains all tasks on `dataset` and persists the bundle when every task
/// succeeded. The previously stored bundle is left untouched otherwise.
pub fn train_and_persist(
    trainer: &ModelTrainer,
    plan: &TrainingPlan,
    store: &dyn ArtifactStore,
    metrics: Option<&PipelineMetrics>,
    dataset: &TrainingDataset,
) -> Result<Vec<TaskOutcome>, PipelineFailure> {
    let run = train_all(trainer, plan, dataset.records());
    if let Some(metrics) = metrics {
        for outcome in &run.outcomes {
            metrics.record_training(outcome);
        }
    }

    let Some(bundle) = run.bundle else {
        let failed: Vec<&str> = run
            .outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.task.as_str())
            .collect();
        return Err(PipelineFailure {
            error: PipelineError::Training {
                tasks: failed.join(", "),
            },
            training_results: run.outcomes,
        });
    };

    match store.save(&bundle) {
        Ok(()) => {
            info!("Persisted models for {:?}", bundle.trained_tasks());
            Ok(run.outcomes)
        }
        Err(e) => Err(PipelineFailure {
            error: PipelineError::Persistence {
                reason: format!("{:#}", e),
            },
            training_results: run.outcomes,
        }),
    }
}

pub struct BookingPipeline {
    extractor: Extractor,
    transformer: Transformer,
    trainer: ModelTrainer,
    store: Arc<dyn ArtifactStore>,
    plan: TrainingPlan,
    metrics: Option<PipelineMetrics>,
    export_path: Option<PathBuf>,
}

impl BookingPipeline {
    pub fn new(
        extractor: Extractor,
        transformer: Transformer,
        trainer: ModelTrainer,
        store: Arc<dyn ArtifactStore>,
        plan: TrainingPlan,
    ) -> Self {
        Self {
            extractor,
            transformer,
            trainer,
            store,
            plan,
            metrics: None,
            export_path: None,
        }
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Writes the loaded dataset as CSV on every run.
    pub fn with_dataset_export(mut self, path: PathBuf) -> Self {
        self.export_path = Some(path);
        self
    }

    pub fn metrics(&self) -> Option<&PipelineMetrics> {
        self.metrics.as_ref()
    }

    /// Runs the full pipeline over the `lookback_days` ending today (UTC).
    pub async fn run_full_pipeline(&self, lookback_days: u32) -> PipelineReport {
        self.run_full_pipeline_as_of(lookback_days, Utc::now().date_naive())
            .await
    }

    /// Runs the full pipeline over the `lookback_days` ending at `as_of`.
    ///
    /// The same source snapshot, window and date always produce the same report.
    pub async fn run_full_pipeline_as_of(
        &self,
        lookback_days: u32,
        as_of: NaiveDate,
    ) -> PipelineReport {
        let started = Instant::now();
        let range = DateRange::lookback(as_of, lookback_days);
        info!(
            "Starting full pipeline run: {} .. {} ({} days)",
            range.start, range.end, lookback_days
        );

        let mut stats = PipelineStats {
            days_covered: lookback_days,
            ..PipelineStats::default()
        };
        let result = self.run_stages(range, &mut stats).await;
        let report = PipelineReport::from_result(stats, result);

        let elapsed = started.elapsed().as_secs_f64();
        if let Some(metrics) = &self.metrics {
            metrics.observe_duration(elapsed);
        }
        info!(
            "Pipeline run finished in {:.2}s (success={})",
            elapsed, report.success
        );
        report
    }

    async fn run_stages(
        &self,
        range: DateRange,
        stats: &mut PipelineStats,
    ) -> Result<Vec<TaskOutcome>, PipelineFailure> {
        let snapshot = self.extractor.extract(range).await?;
        stats.raw_records = snapshot.total();
        if let Some(metrics) = &self.metrics {
            for kind in SourceKind::EXTRACTED {
                metrics.record_extracted(kind, snapshot.of_kind(kind).len());
            }
        }

        let outcome = self.transformer.transform(&snapshot).await;
        stats.transformed_records = outcome.records.len();
        stats.dropped_records = outcome.dropped_total();
        stats.weather_fallbacks = outcome.weather_fallbacks;
        if let Some(metrics) = &self.metrics {
            metrics.record_transform(&outcome);
        }
        if outcome.weather_fallbacks > 0 {
            warn!(
                "{} records used default weather conditions",
                outcome.weather_fallbacks
            );
        }
        info!(
            "Transformed {} of {} records ({} dropped)",
            stats.transformed_records, stats.raw_records, stats.dropped_records
        );

        let dataset = TrainingDataset::load(outcome.records)?;
        if let Some(path) = &self.export_path
            && let Err(e) = dataset.write_csv(path)
        {
            warn!("Dataset export to {:?} failed: {:#}", path, e);
        }

        train_and_persist(
            &self.trainer,
            &self.plan,
            self.store.as_ref(),
            self.metrics.as_ref(),
            &dataset,
        )
    }
}
