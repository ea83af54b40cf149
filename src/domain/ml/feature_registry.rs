//! Named, versioned feature schemas.
//!
//! The key order of a schema is the column order of every matrix built for its
//! task. Any change here is a breaking change for persisted models and must bump
//! the schema version.

use crate::domain::ml::tasks::PredictionTask;
use crate::domain::records::CanonicalBookingRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a feature is turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Encoded through a category table
    Categorical,
    /// 0 or 1
    Flag,
    Numeric,
}

impl FeatureKind {
    pub fn default_value(&self) -> FeatureValue {
        match self {
            FeatureKind::Categorical => FeatureValue::Category(DEFAULT_CATEGORY.to_string()),
            FeatureKind::Flag => FeatureValue::Number(DEFAULT_FLAG),
            FeatureKind::Numeric => FeatureValue::Number(DEFAULT_NUMERIC),
        }
    }
}

/// Category substituted when a categorical feature is missing.
pub const DEFAULT_CATEGORY: &str = "summer";
pub const DEFAULT_FLAG: f64 = 0.0;
pub const DEFAULT_NUMERIC: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
}

impl FeatureSpec {
    const fn categorical(name: &'static str) -> Self {
        Self {
            name,
            kind: FeatureKind::Categorical,
        }
    }

    const fn flag(name: &'static str) -> Self {
        Self {
            name,
            kind: FeatureKind::Flag,
        }
    }

    const fn numeric(name: &'static str) -> Self {
        Self {
            name,
            kind: FeatureKind::Numeric,
        }
    }

    /// Value used when the source does not provide this feature.
    pub fn default_value(&self) -> FeatureValue {
        self.kind.default_value()
    }
}

/// Standard feature list, used as-is by the demand task.
const DEMAND_FEATURES: &[FeatureSpec] = &[
    FeatureSpec::numeric("month"),
    FeatureSpec::categorical("season"),
    FeatureSpec::numeric("day_of_week"),
    FeatureSpec::flag("is_weekend"),
    FeatureSpec::flag("is_holiday"),
    FeatureSpec::numeric("wave_height"),
    FeatureSpec::numeric("wind_speed"),
    FeatureSpec::numeric("water_temp"),
    FeatureSpec::numeric("weather_score"),
    FeatureSpec::numeric("weekend_factor"),
    FeatureSpec::numeric("holiday_factor"),
    FeatureSpec::numeric("weather_factor"),
];

const PRICE_FEATURES: &[FeatureSpec] = &[
    FeatureSpec::numeric("month"),
    FeatureSpec::categorical("season"),
    FeatureSpec::numeric("day_of_week"),
    FeatureSpec::flag("is_weekend"),
    FeatureSpec::flag("is_holiday"),
    FeatureSpec::numeric("wave_height"),
    FeatureSpec::numeric("wind_speed"),
    FeatureSpec::numeric("water_temp"),
    FeatureSpec::numeric("weather_score"),
    FeatureSpec::numeric("predicted_demand"),
    FeatureSpec::numeric("weekend_factor"),
    FeatureSpec::numeric("holiday_factor"),
    FeatureSpec::numeric("weather_factor"),
];

const CANCELLATION_FEATURES: &[FeatureSpec] = &[
    FeatureSpec::numeric("month"),
    FeatureSpec::categorical("season"),
    FeatureSpec::numeric("day_of_week"),
    FeatureSpec::flag("is_weekend"),
    FeatureSpec::flag("is_holiday"),
    FeatureSpec::numeric("wave_height"),
    FeatureSpec::numeric("wind_speed"),
    FeatureSpec::numeric("water_temp"),
    FeatureSpec::numeric("weather_score"),
    FeatureSpec::numeric("predicted_demand"),
    FeatureSpec::numeric("price_multiplier"),
];

/// A fixed, ordered list of feature keys for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub name: &'static str,
    pub version: u32,
    pub features: &'static [FeatureSpec],
}

pub const DEMAND_SCHEMA: FeatureSchema = FeatureSchema {
    name: "demand_features",
    version: 1,
    features: DEMAND_FEATURES,
};

pub const PRICE_SCHEMA: FeatureSchema = FeatureSchema {
    name: "price_features",
    version: 1,
    features: PRICE_FEATURES,
};

pub const CANCELLATION_SCHEMA: FeatureSchema = FeatureSchema {
    name: "cancellation_features",
    version: 1,
    features: CANCELLATION_FEATURES,
};

impl FeatureSchema {
    pub fn for_task(task: PredictionTask) -> Self {
        match task {
            PredictionTask::Demand => DEMAND_SCHEMA,
            PredictionTask::Price => PRICE_SCHEMA,
            PredictionTask::Cancellation => CANCELLATION_SCHEMA,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name).collect()
    }

    /// Serializable identity of the schema, persisted with each artifact.
    pub fn descriptor(&self) -> SchemaDescriptor {
        SchemaDescriptor {
            name: self.name.to_string(),
            version: self.version,
            keys: self.features.iter().map(|f| f.name.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub name: String,
    pub version: u32,
    pub keys: Vec<String>,
}

/// A raw feature value before encoding and scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Category(String),
    Number(f64),
}

/// Anything a feature row can be read from.
///
/// Returning `None` means the source lacks the feature; the schema default applies.
pub trait FeatureSource {
    fn feature(&self, name: &str) -> Option<FeatureValue>;
}

fn flag(value: bool) -> Option<FeatureValue> {
    Some(FeatureValue::Number(if value { 1.0 } else { 0.0 }))
}

fn number(value: f64) -> Option<FeatureValue> {
    Some(FeatureValue::Number(value))
}

impl FeatureSource for CanonicalBookingRecord {
    fn feature(&self, name: &str) -> Option<FeatureValue> {
        match name {
            "month" => number(f64::from(self.month())),
            "season" => Some(FeatureValue::Category(self.season().to_string())),
            "day_of_week" => number(f64::from(self.day_of_week())),
            "is_weekend" => flag(self.is_weekend()),
            "is_holiday" => flag(self.is_holiday()),
            "wave_height" => number(self.wave_height()),
            "wind_speed" => number(self.wind_speed()),
            "water_temp" => number(self.water_temp()),
            "weather_score" => number(self.weather_score()),
            "weekend_factor" => number(self.demand().weekend_factor),
            "holiday_factor" => number(self.demand().holiday_factor),
            "weather_factor" => number(self.demand().weather_factor),
            "predicted_demand" => number(self.demand().predicted_demand),
            "price_multiplier" => number(self.price_multiplier()),
            _ => None,
        }
    }
}

/// Loose key/value input, e.g. a prediction query assembled by a caller.
impl FeatureSource for HashMap<String, FeatureValue> {
    fn feature(&self, name: &str) -> Option<FeatureValue> {
        self.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{BookingObservation, SourceKind};
    use crate::domain::weather::{WeatherConditions, WeatherReading};
    use chrono::NaiveDate;

    fn record() -> CanonicalBookingRecord {
        CanonicalBookingRecord::new(BookingObservation {
            source_id: 1,
            source_kind: SourceKind::Session,
            booking_date: NaiveDate::from_ymd_opt(2024, 7, 6).unwrap(),
            weather: WeatherReading::observed(WeatherConditions::new(2.0, 8.0, 22.0)),
            actual_bookings: 1,
            base_price: 50.0,
            optimized_price: 50.0,
            price_multiplier: 1.0,
            cancellation_probability: 0.1,
            was_cancelled: false,
            spot_name: "Agadir".to_string(),
            surf_level: "intermediate".to_string(),
        })
    }

    #[test]
    fn test_schema_lengths() {
        assert_eq!(DEMAND_SCHEMA.len(), 12);
        assert_eq!(PRICE_SCHEMA.len(), 13);
        assert_eq!(CANCELLATION_SCHEMA.len(), 11);
    }

    #[test]
    fn test_price_schema_inserts_predicted_demand_after_weather_score() {
        let keys = PRICE_SCHEMA.keys();
        let pos = keys.iter().position(|k| *k == "weather_score").unwrap();
        assert_eq!(keys[pos + 1], "predicted_demand");
        let mut without: Vec<&str> = keys.clone();
        without.remove(pos + 1);
        assert_eq!(without, DEMAND_SCHEMA.keys());
    }

    #[test]
    fn test_cancellation_schema_tail() {
        let keys = CANCELLATION_SCHEMA.keys();
        assert_eq!(&keys[..9], &DEMAND_SCHEMA.keys()[..9]);
        assert_eq!(&keys[9..], &["predicted_demand", "price_multiplier"]);
    }

    #[test]
    fn test_record_provides_every_schema_key() {
        let record = record();
        for task in PredictionTask::ALL {
            for spec in FeatureSchema::for_task(task).features {
                assert!(
                    record.feature(spec.name).is_some(),
                    "missing feature {} for {}",
                    spec.name,
                    task
                );
            }
        }
    }

    #[test]
    fn test_record_feature_values() {
        let record = record();
        assert_eq!(
            record.feature("season"),
            Some(FeatureValue::Category("summer".to_string()))
        );
        assert_eq!(record.feature("is_weekend"), Some(FeatureValue::Number(1.0)));
        assert_eq!(record.feature("weather_score"), Some(FeatureValue::Number(10.0)));
        assert_eq!(record.feature("unknown"), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            FeatureSpec::categorical("season").default_value(),
            FeatureValue::Category("summer".to_string())
        );
        assert_eq!(
            FeatureSpec::flag("is_holiday").default_value(),
            FeatureValue::Number(0.0)
        );
        assert_eq!(
            FeatureSpec::numeric("wave_height").default_value(),
            FeatureValue::Number(1.0)
        );
    }

    #[test]
    fn test_descriptor_matches_keys() {
        let descriptor = DEMAND_SCHEMA.descriptor();
        assert_eq!(descriptor.name, "demand_features");
        assert_eq!(descriptor.version, 1);
        assert_eq!(descriptor.keys.len(), DEMAND_SCHEMA.len());
    }
}
