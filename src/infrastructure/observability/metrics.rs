//! Prometheus metrics definitions for surfcast
//!
//! All metrics use the `surfcast_` prefix.

use crate::application::etl::TransformOutcome;
use crate::application::ml::TaskOutcome;
use crate::application::ml::metrics::TaskMetrics;
use crate::domain::records::SourceKind;
use prometheus::{
    CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

/// Prometheus metrics for pipeline runs
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Arc<Registry>,
    /// Source records read, by kind
    pub records_extracted_total: CounterVec,
    /// Canonical records produced, by kind
    pub records_transformed_total: CounterVec,
    /// Source records dropped during transform, by kind
    pub records_dropped_total: CounterVec,
    /// Records that used default weather
    pub weather_fallbacks_total: CounterVec,
    /// Training runs by task and status
    pub training_runs_total: CounterVec,
    /// Test-split R² of the latest regression model, per task
    pub model_r2: GaugeVec,
    /// Test-split accuracy of the latest cancellation model
    pub cancellation_accuracy: GenericGauge<AtomicF64>,
    /// Wall time of full pipeline runs
    pub pipeline_duration_seconds: Histogram,
}

impl PipelineMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let records_extracted_total = CounterVec::new(
            Opts::new(
                "surfcast_records_extracted_total",
                "Source records extracted by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(records_extracted_total.clone()))?;

        let records_transformed_total = CounterVec::new(
            Opts::new(
                "surfcast_records_transformed_total",
                "Canonical records produced by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(records_transformed_total.clone()))?;

        let records_dropped_total = CounterVec::new(
            Opts::new(
                "surfcast_records_dropped_total",
                "Source records dropped during transform by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(records_dropped_total.clone()))?;

        let weather_fallbacks_total = CounterVec::new(
            Opts::new(
                "surfcast_weather_fallbacks_total",
                "Records enriched with default weather",
            ),
            &["stage"],
        )?;
        registry.register(Box::new(weather_fallbacks_total.clone()))?;

        let training_runs_total = CounterVec::new(
            Opts::new(
                "surfcast_training_runs_total",
                "Model training runs by task and status",
            ),
            &["task", "status"],
        )?;
        registry.register(Box::new(training_runs_total.clone()))?;

        let model_r2 = GaugeVec::new(
            Opts::new("surfcast_model_r2", "Test-split R² of regression models"),
            &["task"],
        )?;
        registry.register(Box::new(model_r2.clone()))?;

        let cancellation_accuracy = Gauge::with_opts(Opts::new(
            "surfcast_cancellation_accuracy",
            "Test-split accuracy of the cancellation model (0-1)",
        ))?;
        registry.register(Box::new(cancellation_accuracy.clone()))?;

        let pipeline_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "surfcast_pipeline_duration_seconds",
                "Full pipeline run duration in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0]),
        )?;
        registry.register(Box::new(pipeline_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            records_extracted_total,
            records_transformed_total,
            records_dropped_total,
            weather_fallbacks_total,
            training_runs_total,
            model_r2,
            cancellation_accuracy,
            pipeline_duration_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn record_extracted(&self, kind: SourceKind, count: usize) {
        self.records_extracted_total
            .with_label_values(&[kind.as_str()])
            .inc_by(count as f64);
    }

    pub fn record_transform(&self, outcome: &TransformOutcome) {
        for (kind, count) in &outcome.transformed {
            self.records_transformed_total
                .with_label_values(&[kind.as_str()])
                .inc_by(*count as f64);
        }
        for (kind, count) in &outcome.dropped {
            self.records_dropped_total
                .with_label_values(&[kind.as_str()])
                .inc_by(*count as f64);
        }
        self.weather_fallbacks_total
            .with_label_values(&["etl"])
            .inc_by(outcome.weather_fallbacks as f64);
    }

    pub fn record_training(&self, outcome: &TaskOutcome) {
        let status = if outcome.success { "success" } else { "failure" };
        self.training_runs_total
            .with_label_values(&[outcome.task.as_str(), status])
            .inc();
        match &outcome.metrics {
            Some(TaskMetrics::Regression(m)) => self
                .model_r2
                .with_label_values(&[outcome.task.as_str()])
                .set(m.r2),
            Some(TaskMetrics::Classification(m)) => self.cancellation_accuracy.set(m.accuracy),
            None => {}
        }
    }

    pub fn observe_duration(&self, seconds: f64) {
        self.pipeline_duration_seconds.observe(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::metrics::RegressionMetrics;
    use crate::domain::ml::tasks::PredictionTask;

    #[test]
    fn test_metrics_creation() {
        let metrics = PipelineMetrics::new().expect("Failed to create metrics");
        metrics.observe_duration(1.5);
        assert!(metrics.render().contains("surfcast_pipeline_duration_seconds"));
    }

    #[test]
    fn test_transform_counters() {
        let metrics = PipelineMetrics::new().expect("Failed to create metrics");
        let mut outcome = TransformOutcome::default();
        outcome.transformed.insert(SourceKind::Lesson, 4);
        outcome.dropped.insert(SourceKind::Session, 2);
        outcome.weather_fallbacks = 3;
        metrics.record_extracted(SourceKind::Lesson, 4);
        metrics.record_transform(&outcome);

        let output = metrics.render();
        assert!(output.contains("surfcast_records_extracted_total{kind=\"lesson\"} 4"));
        assert!(output.contains("surfcast_records_transformed_total{kind=\"lesson\"} 4"));
        assert!(output.contains("surfcast_records_dropped_total{kind=\"session\"} 2"));
        assert!(output.contains("surfcast_weather_fallbacks_total{stage=\"etl\"} 3"));
    }

    #[test]
    fn test_training_outcome() {
        let metrics = PipelineMetrics::new().expect("Failed to create metrics");
        metrics.record_training(&TaskOutcome {
            task: PredictionTask::Demand,
            algorithm: "linear".to_string(),
            success: true,
            metrics: Some(TaskMetrics::Regression(RegressionMetrics::evaluate(
                &[1.0, 2.0],
                &[1.0, 2.0],
            ))),
            error: None,
        });
        let output = metrics.render();
        assert!(output.contains("surfcast_training_runs_total"));
        assert!(output.contains("surfcast_model_r2{task=\"demand\"} 1"));
    }
}
