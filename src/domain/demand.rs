//! Multiplicative demand factors for a booking date.

use crate::domain::calendar::CalendarFeatures;
use crate::domain::numeric::round_to;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const WEEKEND_FACTOR: f64 = 1.3;
pub const HOLIDAY_FACTOR: f64 = 1.2;
pub const NEUTRAL_FACTOR: f64 = 1.0;

/// Each weather-score point above (below) 5 adds (removes) 10% demand.
const WEATHER_SENSITIVITY: f64 = 0.1;
const WEATHER_PIVOT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandFactors {
    pub weekend_factor: f64,
    pub holiday_factor: f64,
    pub weather_factor: f64,
    pub predicted_demand: f64,
}

/// Seasonal baseline: low in winter months, high in summer months.
pub fn base_demand(month: u32) -> f64 {
    match month {
        12 | 1 | 2 => 0.6,
        6..=8 => 1.2,
        _ => 1.0,
    }
}

impl DemandFactors {
    /// Computes the factors for `date` given its weather score.
    ///
    /// `predicted_demand` is the product of the unrounded factors and the seasonal
    /// baseline; all four outputs are then rounded to two decimals.
    pub fn calculate(date: NaiveDate, weather_score: f64) -> Self {
        let calendar = CalendarFeatures::from_date(date);
        let weekend_factor = if calendar.is_weekend {
            WEEKEND_FACTOR
        } else {
            NEUTRAL_FACTOR
        };
        let holiday_factor = if calendar.is_holiday {
            HOLIDAY_FACTOR
        } else {
            NEUTRAL_FACTOR
        };
        let weather_factor = NEUTRAL_FACTOR + (weather_score - WEATHER_PIVOT) * WEATHER_SENSITIVITY;
        let predicted_demand =
            base_demand(date.month()) * weekend_factor * holiday_factor * weather_factor;

        Self {
            weekend_factor: round_to(weekend_factor, 2),
            holiday_factor: round_to(holiday_factor, 2),
            weather_factor: round_to(weather_factor, 2),
            predicted_demand: round_to(predicted_demand, 2),
        }
    }
}
