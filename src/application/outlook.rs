//! Demand for the coming days of a spot, driven by its weather forecast.

use crate::application::ml::PredictionService;
use crate::domain::ml::predictions::DemandPrediction;
use crate::domain::ports::WeatherProvider;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

pub struct DemandOutlook {
    weather: Arc<dyn WeatherProvider>,
}

impl DemandOutlook {
    pub fn new(weather: Arc<dyn WeatherProvider>) -> Self {
        Self { weather }
    }

    /// One demand prediction per forecast day for `spot` over the next `days`
    /// days. Days the provider has no forecast for are absent from the result.
    pub async fn forecast_demand(
        &self,
        service: &PredictionService,
        spot: &str,
        days: u32,
    ) -> Result<Vec<DemandPrediction>> {
        let forecast = self
            .weather
            .forecast(spot, days)
            .await
            .with_context(|| format!("Weather forecast for {} failed", spot))?;
        if forecast.is_empty() {
            warn!("No weather forecast available for {}", spot);
            return Ok(Vec::new());
        }

        let mut predictions = Vec::with_capacity(forecast.len());
        for day in &forecast {
            predictions.push(service.predict_demand(day.date, &day.conditions, Some(spot))?);
        }
        info!(
            "Demand outlook for {}: {} days from {}",
            spot,
            predictions.len(),
            forecast[0].date
        );
        Ok(predictions)
    }
}
