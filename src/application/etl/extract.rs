use crate::domain::errors::PipelineError;
use crate::domain::ports::BookingSource;
use crate::domain::records::{DateRange, RawBookingRecord, SourceKind};
use std::sync::Arc;
use tracing::{debug, info};

/// Source records read for one pipeline run, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSnapshot {
    pub lessons: Vec<RawBookingRecord>,
    pub sessions: Vec<RawBookingRecord>,
    pub equipment_orders: Vec<RawBookingRecord>,
}

impl RawSnapshot {
    pub fn total(&self) -> usize {
        self.lessons.len() + self.sessions.len() + self.equipment_orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn of_kind(&self, kind: SourceKind) -> &[RawBookingRecord] {
        match kind {
            SourceKind::Lesson => &self.lessons,
            SourceKind::Session => &self.sessions,
            SourceKind::EquipmentOrder => &self.equipment_orders,
            SourceKind::Synthetic => &[],
        }
    }

    /// All records, lessons first, then sessions, then equipment orders.
    pub fn iter(&self) -> impl Iterator<Item = &RawBookingRecord> {
        self.lessons
            .iter()
            .chain(self.sessions.iter())
            .chain(self.equipment_orders.iter())
    }
}

/// Reads lessons, sessions and equipment orders from the booking system.
pub struct Extractor {
    source: Arc<dyn BookingSource>,
}

impl Extractor {
    pub fn new(source: Arc<dyn BookingSource>) -> Self {
        Self { source }
    }

    pub async fn extract(&self, range: DateRange) -> Result<RawSnapshot, PipelineError> {
        let mut snapshot = RawSnapshot::default();

        for kind in SourceKind::EXTRACTED {
            let mut records = self.source.fetch(kind, range).await.map_err(|e| {
                PipelineError::Extraction {
                    kind: kind.to_string(),
                    reason: format!("{:#}", e),
                }
            })?;

            // Undated records are kept so the transform stage can report them.
            let before = records.len();
            records.retain(|r| r.date.is_none_or(|d| range.contains(d)));
            if records.len() != before {
                debug!(
                    "Ignored {} {} records outside {} .. {}",
                    before - records.len(),
                    kind,
                    range.start,
                    range.end
                );
            }

            info!("Extracted {} {} records", records.len(), kind);
            match kind {
                SourceKind::Lesson => snapshot.lessons = records,
                SourceKind::Session => snapshot.sessions = records,
                SourceKind::EquipmentOrder => snapshot.equipment_orders = records,
                SourceKind::Synthetic => {}
            }
        }

        Ok(snapshot)
    }
}
