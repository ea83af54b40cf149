//! Mapping of source records to canonical booking records.

use super::extract::RawSnapshot;
use crate::domain::ports::WeatherProvider;
use crate::domain::records::{
    BookingObservation, CanonicalBookingRecord, RawBookingRecord, SourceKind,
};
use crate::domain::weather::{WeatherReading, WeatherSource};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const UNKNOWN_SPOT: &str = "Unknown";
pub const DEFAULT_SURF_LEVEL: &str = "beginner";
pub const SESSION_SURF_LEVEL: &str = "intermediate";

/// Per-kind defaults applied while mapping a source record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindMapping {
    pub default_price: f64,
    pub cancellation_probability: f64,
    /// Level used when the surfer has none (or is not consulted)
    pub default_level: &'static str,
    pub uses_surfer_level: bool,
    /// Whether the source status says anything about cancellation
    pub tracks_cancellation: bool,
}

impl KindMapping {
    pub fn for_kind(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Lesson => Self {
                default_price: 100.0,
                cancellation_probability: 0.1,
                default_level: DEFAULT_SURF_LEVEL,
                uses_surfer_level: true,
                tracks_cancellation: true,
            },
            SourceKind::Session => Self {
                default_price: 50.0,
                cancellation_probability: 0.1,
                default_level: SESSION_SURF_LEVEL,
                uses_surfer_level: false,
                tracks_cancellation: true,
            },
            SourceKind::EquipmentOrder | SourceKind::Synthetic => Self {
                default_price: 30.0,
                cancellation_probability: 0.05,
                default_level: DEFAULT_SURF_LEVEL,
                uses_surfer_level: true,
                tracks_cancellation: false,
            },
        }
    }
}

/// Why a source record could not become a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingDate,
    MissingClub,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingDate => write!(f, "missing date"),
            DropReason::MissingClub => write!(f, "missing surf club link"),
        }
    }
}

/// Date and spot a record needs weather for, or the reason it is unusable.
pub fn weather_key(raw: &RawBookingRecord) -> Result<(NaiveDate, String), DropReason> {
    let date = raw.date.ok_or(DropReason::MissingDate)?;
    raw.club_id.ok_or(DropReason::MissingClub)?;
    let spot = raw
        .spot_name
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_SPOT.to_string());
    Ok((date, spot))
}

/// Maps one source record given its weather reading.
pub fn map_record(
    raw: &RawBookingRecord,
    weather: WeatherReading,
) -> Result<CanonicalBookingRecord, DropReason> {
    let (booking_date, spot_name) = weather_key(raw)?;
    let mapping = KindMapping::for_kind(raw.kind);

    let base_price = raw
        .price
        .and_then(|p| p.to_f64())
        .filter(|p| p.is_finite())
        .unwrap_or(mapping.default_price);
    let surf_level = if mapping.uses_surfer_level {
        raw.surfer_level
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| mapping.default_level.to_string())
    } else {
        mapping.default_level.to_string()
    };

    Ok(CanonicalBookingRecord::new(BookingObservation {
        source_id: raw.source_id,
        source_kind: raw.kind,
        booking_date,
        weather,
        actual_bookings: 1,
        base_price,
        optimized_price: base_price,
        price_multiplier: 1.0,
        cancellation_probability: mapping.cancellation_probability,
        was_cancelled: mapping.tracks_cancellation && raw.is_cancelled(),
        spot_name,
        surf_level,
    }))
}

/// Result of transforming a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutcome {
    pub records: Vec<CanonicalBookingRecord>,
    pub dropped: HashMap<SourceKind, usize>,
    pub transformed: HashMap<SourceKind, usize>,
    pub weather_fallbacks: usize,
}

impl TransformOutcome {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Turns raw snapshots into canonical records, enriching them with weather.
pub struct Transformer {
    weather: Arc<dyn WeatherProvider>,
    weather_timeout: Duration,
}

impl Transformer {
    pub fn new(weather: Arc<dyn WeatherProvider>, weather_timeout: Duration) -> Self {
        Self {
            weather,
            weather_timeout,
        }
    }

    /// Observed weather for `date` at `spot`, or the fallback reading when the
    /// provider errors, has no data or does not answer within the timeout.
    async fn lookup(&self, date: NaiveDate, spot: &str) -> WeatherReading {
        match tokio::time::timeout(
            self.weather_timeout,
            self.weather.historical_weather(date, spot),
        )
        .await
        {
            Ok(Ok(Some(conditions))) => WeatherReading::observed(conditions),
            Ok(Ok(None)) => {
                debug!("No weather data for {} on {}, using defaults", spot, date);
                WeatherReading::fallback()
            }
            Ok(Err(e)) => {
                warn!("Weather lookup failed for {} on {}: {}", spot, date, e);
                WeatherReading::fallback()
            }
            Err(_) => {
                warn!(
                    "Weather lookup for {} on {} timed out after {}ms",
                    spot,
                    date,
                    self.weather_timeout.as_millis()
                );
                WeatherReading::fallback()
            }
        }
    }

    /// Maps every record of the snapshot. Bad records are dropped with a
    /// warning; the batch always completes.
    pub async fn transform(&self, snapshot: &RawSnapshot) -> TransformOutcome {
        let mut outcome = TransformOutcome::default();
        let mut cache: HashMap<(NaiveDate, String), WeatherReading> = HashMap::new();

        for raw in snapshot.iter() {
            let key = match weather_key(raw) {
                Ok(key) => key,
                Err(reason) => {
                    warn!(
                        "Dropping {} #{}: {}",
                        raw.kind, raw.source_id, reason
                    );
                    *outcome.dropped.entry(raw.kind).or_default() += 1;
                    continue;
                }
            };

            let weather = match cache.get(&key) {
                Some(reading) => *reading,
                None => {
                    let reading = self.lookup(key.0, &key.1).await;
                    cache.insert(key, reading);
                    reading
                }
            };
            if weather.source == WeatherSource::Fallback {
                outcome.weather_fallbacks += 1;
            }

            match map_record(raw, weather) {
                Ok(record) => {
                    *outcome.transformed.entry(raw.kind).or_default() += 1;
                    outcome.records.push(record);
                }
                Err(reason) => {
                    warn!(
                        "Dropping {} #{}: {}",
                        raw.kind, raw.source_id, reason
                    );
                    *outcome.dropped.entry(raw.kind).or_default() += 1;
                }
            }
        }

        outcome
    }
}
