//! In-memory booking source for tests and offline runs.

use crate::domain::ports::BookingSource;
use crate::domain::records::{DateRange, RawBookingRecord, SourceKind};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Holds source records in memory. Filtering matches the SQLite source:
/// undated records are always returned.
#[derive(Clone, Default)]
pub struct InMemoryBookingSource {
    records: Arc<RwLock<Vec<RawBookingRecord>>>,
}

impl InMemoryBookingSource {
    pub fn new(records: Vec<RawBookingRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn push(&self, record: RawBookingRecord) {
        self.records.write().await.push(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl BookingSource for InMemoryBookingSource {
    async fn fetch(&self, kind: SourceKind, range: DateRange) -> Result<Vec<RawBookingRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.kind == kind && r.date.is_none_or(|d| range.contains(d)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: i64, kind: SourceKind, date: Option<NaiveDate>) -> RawBookingRecord {
        RawBookingRecord {
            source_id: id,
            kind,
            date,
            club_id: Some(1),
            spot_name: None,
            price: None,
            surfer_level: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_filters_kind_and_range() {
        let inside = NaiveDate::from_ymd_opt(2024, 3, 10);
        let outside = NaiveDate::from_ymd_opt(2022, 3, 10);
        let source = InMemoryBookingSource::new(vec![
            record(1, SourceKind::Lesson, inside),
            record(2, SourceKind::Lesson, outside),
            record(3, SourceKind::Session, inside),
        ]);
        source.push(record(4, SourceKind::Lesson, None)).await;
        assert_eq!(source.len().await, 4);

        let range = DateRange::lookback(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 365);
        let lessons = source.fetch(SourceKind::Lesson, range).await.unwrap();
        let ids: Vec<i64> = lessons.iter().map(|r| r.source_id).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
