//! Surf weather conditions and the 0-10 suitability score.

use crate::domain::numeric::round_to;
use crate::domain::tiers::{Tier, TierTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_WAVE_HEIGHT: f64 = 1.5;
pub const DEFAULT_WIND_SPEED: f64 = 15.0;
pub const DEFAULT_WATER_TEMP: f64 = 22.0;

/// Score attached to records whose weather lookup failed.
pub const FALLBACK_WEATHER_SCORE: f64 = 7.0;

const WAVE_WEIGHT: f64 = 0.5;
const WIND_WEIGHT: f64 = 0.3;
const TEMP_WEIGHT: f64 = 0.2;

const WAVE_TIERS: &[Tier<f64>] = &[
    Tier {
        predicate: |h| (1.0..=3.0).contains(&h),
        value: 10.0,
    },
    Tier {
        predicate: |h| (0.5..1.0).contains(&h),
        value: 7.0,
    },
    Tier {
        predicate: |h| h > 3.0 && h <= 4.0,
        value: 6.0,
    },
];

const WIND_TIERS: &[Tier<f64>] = &[
    Tier {
        predicate: |w| w < 10.0,
        value: 10.0,
    },
    Tier {
        predicate: |w| w < 15.0,
        value: 8.0,
    },
    Tier {
        predicate: |w| w < 20.0,
        value: 5.0,
    },
];

const TEMP_TIERS: &[Tier<f64>] = &[
    Tier {
        predicate: |t| (18.0..=25.0).contains(&t),
        value: 10.0,
    },
    Tier {
        predicate: |t| (15.0..18.0).contains(&t) || (t > 25.0 && t <= 28.0),
        value: 7.0,
    },
];

pub const WAVE_SCORE: TierTable<f64> = TierTable::new(WAVE_TIERS, 3.0);
pub const WIND_SCORE: TierTable<f64> = TierTable::new(WIND_TIERS, 2.0);
pub const TEMP_SCORE: TierTable<f64> = TierTable::new(TEMP_TIERS, 4.0);

/// Surf-relevant weather for one day at one spot.
///
/// Missing fields deserialize to the documented defaults, so a partial
/// forecast payload still yields a complete reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    /// Wave height in meters
    #[serde(default = "default_wave_height")]
    pub wave_height: f64,
    /// Wind speed in km/h
    #[serde(default = "default_wind_speed")]
    pub wind_speed: f64,
    /// Water temperature in °C
    #[serde(default = "default_water_temp")]
    pub water_temp: f64,
}

fn default_wave_height() -> f64 {
    DEFAULT_WAVE_HEIGHT
}

fn default_wind_speed() -> f64 {
    DEFAULT_WIND_SPEED
}

fn default_water_temp() -> f64 {
    DEFAULT_WATER_TEMP
}

impl Default for WeatherConditions {
    fn default() -> Self {
        Self {
            wave_height: DEFAULT_WAVE_HEIGHT,
            wind_speed: DEFAULT_WIND_SPEED,
            water_temp: DEFAULT_WATER_TEMP,
        }
    }
}

impl WeatherConditions {
    pub fn new(wave_height: f64, wind_speed: f64, water_temp: f64) -> Self {
        Self {
            wave_height,
            wind_speed,
            water_temp,
        }
    }

    pub fn score(&self) -> f64 {
        suitability_score(self.wave_height, self.wind_speed, self.water_temp)
    }
}

/// Where a record's weather came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherSource {
    Observed,
    Fallback,
}

impl fmt::Display for WeatherSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherSource::Observed => write!(f, "observed"),
            WeatherSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Weather attached to a historical record, with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub conditions: WeatherConditions,
    pub source: WeatherSource,
}

impl WeatherReading {
    pub fn observed(conditions: WeatherConditions) -> Self {
        Self {
            conditions,
            source: WeatherSource::Observed,
        }
    }

    pub fn fallback() -> Self {
        Self {
            conditions: WeatherConditions::default(),
            source: WeatherSource::Fallback,
        }
    }

    /// Observed readings are scored; fallback readings carry the fixed fallback score.
    pub fn score(&self) -> f64 {
        match self.source {
            WeatherSource::Observed => self.conditions.score(),
            WeatherSource::Fallback => FALLBACK_WEATHER_SCORE,
        }
    }
}

/// One day of a spot forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub conditions: WeatherConditions,
}

/// Maps raw weather metrics to a 0-10 surf suitability score, rounded to one decimal.
///
/// Total over all numeric inputs: out-of-range values and NaN fall through to the
/// lowest tier of each component.
pub fn suitability_score(wave_height: f64, wind_speed: f64, water_temp: f64) -> f64 {
    let score = WAVE_SCORE.evaluate(wave_height) * WAVE_WEIGHT
        + WIND_SCORE.evaluate(wind_speed) * WIND_WEIGHT
        + TEMP_SCORE.evaluate(water_temp) * TEMP_WEIGHT;
    round_to(score, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ideal_conditions_score_ten() {
        assert_eq!(suitability_score(2.0, 8.0, 22.0), 10.0);
    }

    #[test]
    fn test_poor_conditions() {
        assert_eq!(suitability_score(0.3, 25.0, 30.0), 2.9);
    }

    #[test]
    fn test_wave_tier_boundaries() {
        assert_eq!(WAVE_SCORE.evaluate(1.0), 10.0);
        assert_eq!(WAVE_SCORE.evaluate(3.0), 10.0);
        assert_eq!(WAVE_SCORE.evaluate(0.5), 7.0);
        assert_eq!(WAVE_SCORE.evaluate(0.99), 7.0);
        assert_eq!(WAVE_SCORE.evaluate(3.01), 6.0);
        assert_eq!(WAVE_SCORE.evaluate(4.0), 6.0);
        assert_eq!(WAVE_SCORE.evaluate(4.01), 3.0);
        assert_eq!(WAVE_SCORE.evaluate(0.49), 3.0);
    }

    #[test]
    fn test_wind_tier_boundaries() {
        assert_eq!(WIND_SCORE.evaluate(9.99), 10.0);
        assert_eq!(WIND_SCORE.evaluate(10.0), 8.0);
        assert_eq!(WIND_SCORE.evaluate(15.0), 5.0);
        assert_eq!(WIND_SCORE.evaluate(20.0), 2.0);
    }

    #[test]
    fn test_temp_tier_boundaries() {
        assert_eq!(TEMP_SCORE.evaluate(18.0), 10.0);
        assert_eq!(TEMP_SCORE.evaluate(25.0), 10.0);
        assert_eq!(TEMP_SCORE.evaluate(15.0), 7.0);
        assert_eq!(TEMP_SCORE.evaluate(25.5), 7.0);
        assert_eq!(TEMP_SCORE.evaluate(28.0), 7.0);
        assert_eq!(TEMP_SCORE.evaluate(28.5), 4.0);
        assert_eq!(TEMP_SCORE.evaluate(14.9), 4.0);
    }

    #[test]
    fn test_score_is_total() {
        let score = suitability_score(f64::NAN, f64::INFINITY, -40.0);
        assert_eq!(score, 2.9);
        for (h, w, t) in [(-1.0, -5.0, 0.0), (100.0, 200.0, 60.0), (1.5, 15.0, 22.0)] {
            let s = suitability_score(h, w, t);
            assert!((0.0..=10.0).contains(&s));
        }
    }

    #[test]
    fn test_fallback_reading_uses_fixed_score() {
        let reading = WeatherReading::fallback();
        assert_eq!(reading.conditions, WeatherConditions::default());
        assert_eq!(reading.score(), FALLBACK_WEATHER_SCORE);
        // The same conditions, observed, are scored by the formula.
        assert_eq!(WeatherReading::observed(reading.conditions).score(), 8.5);
    }

    #[test]
    fn test_partial_payload_defaults() {
        let conditions: WeatherConditions =
            serde_json::from_str(r#"{"wave_height": 2.5}"#).expect("valid payload");
        assert_eq!(conditions.wave_height, 2.5);
        assert_eq!(conditions.wind_speed, DEFAULT_WIND_SPEED);
        assert_eq!(conditions.water_temp, DEFAULT_WATER_TEMP);
    }
}
