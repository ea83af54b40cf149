use crate::domain::records::{DateRange, RawBookingRecord, SourceKind};
use crate::domain::weather::{DailyForecast, WeatherConditions};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Read-only access to historical bookings in the booking system.
#[async_trait]
pub trait BookingSource: Send + Sync {
    /// Records of `kind` whose date falls inside `range` (inclusive).
    async fn fetch(&self, kind: SourceKind, range: DateRange) -> Result<Vec<RawBookingRecord>>;
}

/// Weather data for surf spots.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Observed weather for a past date, `None` when the provider has no data.
    async fn historical_weather(
        &self,
        date: NaiveDate,
        location: &str,
    ) -> Result<Option<WeatherConditions>>;

    /// Daily forecast for the next `days` days.
    async fn forecast(&self, location: &str, days: u32) -> Result<Vec<DailyForecast>>;
}
