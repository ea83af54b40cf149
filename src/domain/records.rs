//! Source records and the canonical booking record built from them.

use crate::domain::calendar::{CalendarFeatures, Season};
use crate::domain::demand::DemandFactors;
use crate::domain::weather::{WeatherReading, WeatherSource};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of booking-like event a record originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Lesson,
    Session,
    EquipmentOrder,
    Synthetic,
}

impl SourceKind {
    /// Kinds read from the booking system during extraction.
    pub const EXTRACTED: [SourceKind; 3] = [
        SourceKind::Lesson,
        SourceKind::Session,
        SourceKind::EquipmentOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Lesson => "lesson",
            SourceKind::Session => "session",
            SourceKind::EquipmentOrder => "equipment_order",
            SourceKind::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window of `days` days ending at `as_of` (inclusive).
    pub fn lookback(as_of: NaiveDate, days: u32) -> Self {
        Self {
            start: as_of - Duration::days(i64::from(days)),
            end: as_of,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// A lesson, session or equipment order as read from the booking system.
///
/// Every field except the identity may be absent in the source; the ETL stage
/// decides which gaps are fatal for the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBookingRecord {
    pub source_id: i64,
    pub kind: SourceKind,
    pub date: Option<NaiveDate>,
    pub club_id: Option<i64>,
    pub spot_name: Option<String>,
    pub price: Option<Decimal>,
    pub surfer_level: Option<String>,
    pub status: Option<String>,
}

impl RawBookingRecord {
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }
}

/// The non-derived inputs of a canonical record.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingObservation {
    pub source_id: i64,
    pub source_kind: SourceKind,
    pub booking_date: NaiveDate,
    pub weather: WeatherReading,
    pub actual_bookings: u32,
    pub base_price: f64,
    pub optimized_price: f64,
    pub price_multiplier: f64,
    pub cancellation_probability: f64,
    pub was_cancelled: bool,
    pub spot_name: String,
    pub surf_level: String,
}

/// One normalized historical booking event.
///
/// Fields are private: the only way to obtain a record is [`CanonicalBookingRecord::new`],
/// which derives the calendar, weather-score and demand fields from the observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalBookingRecord {
    source_id: i64,
    source_kind: SourceKind,
    booking_date: NaiveDate,
    calendar: CalendarFeatures,
    weather: WeatherReading,
    weather_score: f64,
    demand: DemandFactors,
    actual_bookings: u32,
    base_price: f64,
    optimized_price: f64,
    price_multiplier: f64,
    cancellation_probability: f64,
    was_cancelled: bool,
    spot_name: String,
    surf_level: String,
}

impl CanonicalBookingRecord {
    pub fn new(observation: BookingObservation) -> Self {
        let weather_score = observation.weather.score();
        Self {
            source_id: observation.source_id,
            source_kind: observation.source_kind,
            booking_date: observation.booking_date,
            calendar: CalendarFeatures::from_date(observation.booking_date),
            weather: observation.weather,
            weather_score,
            demand: DemandFactors::calculate(observation.booking_date, weather_score),
            actual_bookings: observation.actual_bookings,
            base_price: observation.base_price,
            optimized_price: observation.optimized_price,
            price_multiplier: observation.price_multiplier,
            cancellation_probability: observation.cancellation_probability,
            was_cancelled: observation.was_cancelled,
            spot_name: observation.spot_name,
            surf_level: observation.surf_level,
        }
    }

    pub fn source_id(&self) -> i64 {
        self.source_id
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn booking_date(&self) -> NaiveDate {
        self.booking_date
    }

    pub fn month(&self) -> u32 {
        self.calendar.month
    }

    pub fn season(&self) -> Season {
        self.calendar.season
    }

    pub fn day_of_week(&self) -> u32 {
        self.calendar.day_of_week
    }

    pub fn is_weekend(&self) -> bool {
        self.calendar.is_weekend
    }

    pub fn is_holiday(&self) -> bool {
        self.calendar.is_holiday
    }

    pub fn weather(&self) -> &WeatherReading {
        &self.weather
    }

    pub fn wave_height(&self) -> f64 {
        self.weather.conditions.wave_height
    }

    pub fn wind_speed(&self) -> f64 {
        self.weather.conditions.wind_speed
    }

    pub fn water_temp(&self) -> f64 {
        self.weather.conditions.water_temp
    }

    pub fn weather_source(&self) -> WeatherSource {
        self.weather.source
    }

    pub fn weather_score(&self) -> f64 {
        self.weather_score
    }

    pub fn demand(&self) -> &DemandFactors {
        &self.demand
    }

    pub fn actual_bookings(&self) -> u32 {
        self.actual_bookings
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    pub fn optimized_price(&self) -> f64 {
        self.optimized_price
    }

    pub fn price_multiplier(&self) -> f64 {
        self.price_multiplier
    }

    pub fn cancellation_probability(&self) -> f64 {
        self.cancellation_probability
    }

    pub fn was_cancelled(&self) -> bool {
        self.was_cancelled
    }

    pub fn spot_name(&self) -> &str {
        &self.spot_name
    }

    pub fn surf_level(&self) -> &str {
        &self.surf_level
    }

    /// Flat view used for CSV export and quality checks.
    pub fn to_row(&self) -> CanonicalRow {
        CanonicalRow {
            source_id: self.source_id,
            source_kind: self.source_kind.to_string(),
            booking_date: self.booking_date.to_string(),
            month: self.calendar.month,
            season: self.calendar.season.to_string(),
            day_of_week: self.calendar.day_of_week,
            is_weekend: u8::from(self.calendar.is_weekend),
            is_holiday: u8::from(self.calendar.is_holiday),
            wave_height: self.wave_height(),
            wind_speed: self.wind_speed(),
            water_temp: self.water_temp(),
            weather_source: self.weather.source.to_string(),
            weather_score: self.weather_score,
            weekend_factor: self.demand.weekend_factor,
            holiday_factor: self.demand.holiday_factor,
            weather_factor: self.demand.weather_factor,
            predicted_demand: self.demand.predicted_demand,
            actual_bookings: i64::from(self.actual_bookings),
            base_price: self.base_price,
            optimized_price: self.optimized_price,
            price_multiplier: self.price_multiplier,
            cancellation_probability: self.cancellation_probability,
            was_cancelled: u8::from(self.was_cancelled),
            spot_name: self.spot_name.clone(),
            surf_level: self.surf_level.clone(),
        }
    }
}

/// Column layout of an exported dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub source_id: i64,
    pub source_kind: String,
    pub booking_date: String,
    pub month: u32,
    pub season: String,
    pub day_of_week: u32,
    pub is_weekend: u8,
    pub is_holiday: u8,
    pub wave_height: f64,
    pub wind_speed: f64,
    pub water_temp: f64,
    pub weather_source: String,
    pub weather_score: f64,
    pub weekend_factor: f64,
    pub holiday_factor: f64,
    pub weather_factor: f64,
    pub predicted_demand: f64,
    pub actual_bookings: i64,
    pub base_price: f64,
    pub optimized_price: f64,
    pub price_multiplier: f64,
    pub cancellation_probability: f64,
    pub was_cancelled: u8,
    pub spot_name: String,
    pub surf_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::weather::{FALLBACK_WEATHER_SCORE, WeatherConditions};

    fn observation(date: NaiveDate, weather: WeatherReading) -> BookingObservation {
        BookingObservation {
            source_id: 7,
            source_kind: SourceKind::Lesson,
            booking_date: date,
            weather,
            actual_bookings: 1,
            base_price: 100.0,
            optimized_price: 100.0,
            price_multiplier: 1.0,
            cancellation_probability: 0.1,
            was_cancelled: false,
            spot_name: "Taghazout".to_string(),
            surf_level: "beginner".to_string(),
        }
    }

    #[test]
    fn test_derived_fields_follow_observation() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 6).unwrap();
        let record = CanonicalBookingRecord::new(observation(
            date,
            WeatherReading::observed(WeatherConditions::new(2.0, 12.0, 22.0)),
        ));
        assert_eq!(record.month(), 7);
        assert_eq!(record.season(), Season::Summer);
        assert_eq!(record.day_of_week(), 5);
        assert!(record.is_weekend());
        assert!(record.is_holiday());
        // 10*0.5 + 8*0.3 + 10*0.2
        assert_eq!(record.weather_score(), 9.4);
        assert_eq!(
            record.demand(),
            &DemandFactors::calculate(date, record.weather_score())
        );
    }

    #[test]
    fn test_fallback_weather_record() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let record = CanonicalBookingRecord::new(observation(date, WeatherReading::fallback()));
        assert_eq!(record.wave_height(), 1.5);
        assert_eq!(record.wind_speed(), 15.0);
        assert_eq!(record.water_temp(), 22.0);
        assert_eq!(record.weather_score(), FALLBACK_WEATHER_SCORE);
        assert_eq!(record.weather_source(), WeatherSource::Fallback);
        assert_eq!(record.demand().weather_factor, 1.2);
    }

    #[test]
    fn test_row_flattens_flags() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let row = CanonicalBookingRecord::new(observation(date, WeatherReading::fallback())).to_row();
        assert_eq!(row.is_weekend, 1);
        assert_eq!(row.is_holiday, 1);
        assert_eq!(row.was_cancelled, 0);
        assert_eq!(row.season, "winter");
        assert_eq!(row.source_kind, "lesson");
        assert_eq!(row.weather_source, "fallback");
        assert_eq!(row.booking_date, "2024-12-15");
    }

    #[test]
    fn test_lookback_window_is_inclusive() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let range = DateRange::lookback(as_of, 30);
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert!(range.contains(range.start));
        assert!(range.contains(as_of));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
    }

    #[test]
    fn test_cancelled_status_is_case_insensitive() {
        let mut raw = RawBookingRecord {
            source_id: 1,
            kind: SourceKind::Lesson,
            date: None,
            club_id: None,
            spot_name: None,
            price: None,
            surfer_level: None,
            status: Some("Cancelled".to_string()),
        };
        assert!(raw.is_cancelled());
        raw.status = Some("confirmed".to_string());
        assert!(!raw.is_cancelled());
        raw.status = None;
        assert!(!raw.is_cancelled());
    }
}
