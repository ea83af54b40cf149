//! Offline weather providers.

use crate::domain::calendar::Season;
use crate::domain::numeric::round_to;
use crate::domain::ports::WeatherProvider;
use crate::domain::weather::{DailyForecast, WeatherConditions};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, Utc};

/// Long-run averages for one spot.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotClimate {
    pub name: String,
    pub wave_height: f64,
    pub wind_speed: f64,
    /// Added to the regional sea temperature
    pub water_temp_offset: f64,
}

impl SpotClimate {
    pub fn new(name: &str, wave_height: f64, wind_speed: f64, water_temp_offset: f64) -> Self {
        Self {
            name: name.to_string(),
            wave_height,
            wind_speed,
            water_temp_offset,
        }
    }
}

/// Regional sea surface temperature by month, January first.
const SEA_TEMPERATURE: [f64; 12] = [
    17.0, 16.5, 17.0, 17.5, 18.5, 20.0, 21.5, 22.0, 22.0, 21.0, 19.5, 18.0,
];

fn swell_factor(season: Season) -> f64 {
    match season {
        Season::Winter => 1.3,
        Season::Autumn => 1.1,
        Season::Spring => 1.0,
        Season::Summer => 0.8,
    }
}

/// Deterministic climatology for the Moroccan Atlantic spots.
///
/// Locations are matched case-insensitively on the spot name; unknown
/// locations have no data.
#[derive(Debug, Clone)]
pub struct StaticWeatherProvider {
    spots: Vec<SpotClimate>,
}

impl Default for StaticWeatherProvider {
    fn default() -> Self {
        Self {
            spots: vec![
                SpotClimate::new("Taghazout", 1.8, 12.0, 0.5),
                SpotClimate::new("Agadir", 1.2, 15.0, 0.5),
                SpotClimate::new("Essaouira", 2.1, 18.0, -1.0),
                SpotClimate::new("Bouznika", 1.5, 10.0, -0.5),
            ],
        }
    }
}

impl StaticWeatherProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spot(mut self, spot: SpotClimate) -> Self {
        self.spots.retain(|s| !s.name.eq_ignore_ascii_case(&spot.name));
        self.spots.push(spot);
        self
    }

    fn climate(&self, location: &str) -> Option<&SpotClimate> {
        let location = location.trim();
        self.spots
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(location))
    }

    /// Typical conditions at `spot` on `date`.
    pub fn conditions_for(spot: &SpotClimate, date: NaiveDate) -> WeatherConditions {
        let month = date.month();
        let season = Season::from_month(month);
        let sea = SEA_TEMPERATURE[(month as usize).saturating_sub(1) % 12];
        WeatherConditions::new(
            round_to(spot.wave_height * swell_factor(season), 1),
            spot.wind_speed,
            round_to(sea + spot.water_temp_offset, 1),
        )
    }
}

#[async_trait]
impl WeatherProvider for StaticWeatherProvider {
    async fn historical_weather(
        &self,
        date: NaiveDate,
        location: &str,
    ) -> Result<Option<WeatherConditions>> {
        Ok(self
            .climate(location)
            .map(|spot| Self::conditions_for(spot, date)))
    }

    async fn forecast(&self, location: &str, days: u32) -> Result<Vec<DailyForecast>> {
        let Some(spot) = self.climate(location) else {
            return Ok(Vec::new());
        };
        let today = Utc::now().date_naive();
        Ok((0..u64::from(days))
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .map(|date| DailyForecast {
                date,
                conditions: Self::conditions_for(spot, date),
            })
            .collect())
    }
}

/// Provider with no data at all; every record gets the default conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableWeatherProvider;

#[async_trait]
impl WeatherProvider for UnavailableWeatherProvider {
    async fn historical_weather(
        &self,
        _date: NaiveDate,
        _location: &str,
    ) -> Result<Option<WeatherConditions>> {
        Ok(None)
    }

    async fn forecast(&self, _location: &str, _days: u32) -> Result<Vec<DailyForecast>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_spot_is_case_insensitive() {
        let provider = StaticWeatherProvider::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let conditions = provider
            .historical_weather(date, "taghazout")
            .await
            .unwrap()
            .unwrap();
        // Winter swell on the 1.8 m average
        assert_eq!(conditions.wave_height, 2.3);
        assert_eq!(conditions.wind_speed, 12.0);
        assert_eq!(conditions.water_temp, 17.5);
    }

    #[tokio::test]
    async fn test_unknown_spot_has_no_data() {
        let provider = StaticWeatherProvider::new();
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(
            provider
                .historical_weather(date, "Unknown")
                .await
                .unwrap()
                .is_none()
        );
        assert!(provider.forecast("Unknown", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forecast_covers_requested_days() {
        let provider = StaticWeatherProvider::new().with_spot(SpotClimate::new(
            "Imsouane",
            2.0,
            14.0,
            0.0,
        ));
        let forecast = provider.forecast("Imsouane", 5).await.unwrap();
        assert_eq!(forecast.len(), 5);
        assert!(forecast.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn test_unavailable_provider() {
        let provider = UnavailableWeatherProvider;
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!(
            provider
                .historical_weather(date, "Taghazout")
                .await
                .unwrap()
                .is_none()
        );
    }
}
