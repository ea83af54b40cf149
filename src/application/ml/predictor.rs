//! Inference against a loaded artifact bundle.

use super::artifacts::{ArtifactBundle, ArtifactStore, TrainedModelArtifact};
use super::models::to_matrix;
use crate::domain::calendar::CalendarFeatures;
use crate::domain::demand::DemandFactors;
use crate::domain::errors::PredictionError;
use crate::domain::ml::feature_registry::{FeatureSchema, FeatureSource, FeatureValue};
use crate::domain::ml::predictions::{
    BookingQuery, CancellationRisk, DemandPrediction, PriceOptimization, PriceRecommendation,
};
use crate::domain::ml::tasks::PredictionTask;
use crate::domain::numeric::round_to;
use crate::domain::weather::WeatherConditions;
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Features of a future booking, derived the same way as for historical records.
pub struct QueryFeatures {
    calendar: CalendarFeatures,
    weather: WeatherConditions,
    weather_score: f64,
    factors: DemandFactors,
    predicted_demand: Option<f64>,
    price_multiplier: Option<f64>,
}

impl QueryFeatures {
    pub fn new(date: NaiveDate, weather: WeatherConditions) -> Self {
        let weather_score = weather.score();
        Self {
            calendar: CalendarFeatures::from_date(date),
            weather,
            weather_score,
            factors: DemandFactors::calculate(date, weather_score),
            predicted_demand: None,
            price_multiplier: None,
        }
    }

    pub fn with_predicted_demand(mut self, demand: Option<f64>) -> Self {
        self.predicted_demand = demand;
        self
    }

    pub fn with_price_multiplier(mut self, multiplier: Option<f64>) -> Self {
        self.price_multiplier = multiplier;
        self
    }
}

impl FeatureSource for QueryFeatures {
    fn feature(&self, name: &str) -> Option<FeatureValue> {
        let number = |v: f64| Some(FeatureValue::Number(v));
        let flag = |b: bool| number(if b { 1.0 } else { 0.0 });
        match name {
            "month" => number(f64::from(self.calendar.month)),
            "season" => Some(FeatureValue::Category(self.calendar.season.to_string())),
            "day_of_week" => number(f64::from(self.calendar.day_of_week)),
            "is_weekend" => flag(self.calendar.is_weekend),
            "is_holiday" => flag(self.calendar.is_holiday),
            "wave_height" => number(self.weather.wave_height),
            "wind_speed" => number(self.weather.wind_speed),
            "water_temp" => number(self.weather.water_temp),
            "weather_score" => number(self.weather_score),
            "weekend_factor" => number(self.factors.weekend_factor),
            "holiday_factor" => number(self.factors.holiday_factor),
            "weather_factor" => number(self.factors.weather_factor),
            // Caller-supplied; absent values fall back to the schema default
            "predicted_demand" => self.predicted_demand.and_then(number),
            "price_multiplier" => self.price_multiplier.and_then(number),
            _ => None,
        }
    }
}

/// Which tasks currently have a model loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub demand: bool,
    pub price: bool,
    pub cancellation: bool,
}

/// Serves demand, price and cancellation predictions from an artifact bundle.
///
/// Constructed explicitly and shared by reference; it holds no global state.
#[derive(Debug, Default)]
pub struct PredictionService {
    bundle: Option<ArtifactBundle>,
}

impl PredictionService {
    pub fn new(bundle: Option<ArtifactBundle>) -> Self {
        Self { bundle }
    }

    /// Loads whatever the store holds. A missing bundle is not an error: the
    /// service starts empty and every prediction reports `ModelNotTrained`.
    pub fn from_store(store: &dyn ArtifactStore) -> Result<Self> {
        let bundle = store.load()?;
        match &bundle {
            Some(b) => info!(
                "Prediction service loaded models for {:?}",
                b.trained_tasks()
            ),
            None => warn!("No trained models found. Predictions are unavailable until training runs."),
        }
        Ok(Self::new(bundle))
    }

    /// Replaces the loaded bundle with the store's current content.
    pub fn reload(&mut self, store: &dyn ArtifactStore) -> Result<()> {
        *self = Self::from_store(store)?;
        Ok(())
    }

    pub fn replace_bundle(&mut self, bundle: ArtifactBundle) {
        self.bundle = Some(bundle);
    }

    pub fn status(&self) -> ServiceStatus {
        let has = |task| self.bundle.as_ref().is_some_and(|b| b.get(task).is_some());
        ServiceStatus {
            demand: has(PredictionTask::Demand),
            price: has(PredictionTask::Price),
            cancellation: has(PredictionTask::Cancellation),
        }
    }

    fn artifact(&self, task: PredictionTask) -> Result<&TrainedModelArtifact, PredictionError> {
        let artifact = self
            .bundle
            .as_ref()
            .and_then(|b| b.get(task))
            .ok_or(PredictionError::ModelNotTrained { task })?;

        let expected = FeatureSchema::for_task(task).descriptor();
        if artifact.schema != expected || artifact.pipeline.schema() != &expected {
            return Err(PredictionError::SchemaMismatch {
                task,
                expected: format!("{} v{}", expected.name, expected.version),
                found: format!("{} v{}", artifact.schema.name, artifact.schema.version),
            });
        }
        Ok(artifact)
    }

    fn predict_one(
        &self,
        task: PredictionTask,
        features: &QueryFeatures,
    ) -> Result<f64, PredictionError> {
        let artifact = self.artifact(task)?;
        let row = artifact.pipeline.transform(features);
        let model_error = |reason: String| PredictionError::Model { task, reason };
        let matrix = to_matrix(&[row]).map_err(model_error)?;
        artifact
            .model
            .predict(&matrix)
            .map_err(model_error)?
            .first()
            .copied()
            .ok_or_else(|| model_error("No prediction returned".to_string()))
    }

    /// Expected demand for `date` under `weather`, clamped at zero.
    pub fn predict_demand(
        &self,
        date: NaiveDate,
        weather: &WeatherConditions,
        spot_name: Option<&str>,
    ) -> Result<DemandPrediction, PredictionError> {
        let features = QueryFeatures::new(date, *weather);
        let raw = self.predict_one(PredictionTask::Demand, &features)?;
        Ok(DemandPrediction::from_model_output(
            date,
            spot_name.map(str::to_string),
            raw,
            *weather,
        ))
    }

    /// Optimized price for `date`; the demand prediction feeds the price model.
    pub fn optimize_price(
        &self,
        date: NaiveDate,
        weather: &WeatherConditions,
        base_price: f64,
    ) -> Result<PriceOptimization, PredictionError> {
        if !base_price.is_finite() || base_price <= 0.0 {
            return Err(PredictionError::InvalidInput {
                reason: format!("base price must be positive, got {}", base_price),
            });
        }

        let demand = self.predict_demand(date, weather, None)?;
        let features =
            QueryFeatures::new(date, *weather).with_predicted_demand(Some(demand.predicted_demand));
        let optimized_price = self
            .predict_one(PredictionTask::Price, &features)?
            .max(0.0);

        Ok(PriceOptimization {
            date,
            base_price,
            optimized_price: round_to(optimized_price, 2),
            price_multiplier: round_to(optimized_price / base_price, 2),
            predicted_demand: demand.predicted_demand,
            recommendations: PriceRecommendation::for_prices(
                base_price,
                optimized_price,
                demand.predicted_demand,
            ),
        })
    }

    /// Probability that `booking` gets cancelled, always within [0, 1].
    pub fn predict_cancellation_probability(
        &self,
        booking: &BookingQuery,
    ) -> Result<CancellationRisk, PredictionError> {
        let features = QueryFeatures::new(booking.booking_date, booking.weather)
            .with_predicted_demand(booking.predicted_demand)
            .with_price_multiplier(booking.price_multiplier);
        let raw = self.predict_one(PredictionTask::Cancellation, &features)?;
        Ok(CancellationRisk::from_model_output(raw))
    }
}
