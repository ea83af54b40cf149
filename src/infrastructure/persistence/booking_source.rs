use super::database::Database;
use crate::domain::ports::BookingSource;
use crate::domain::records::{DateRange, RawBookingRecord, SourceKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::str::FromStr;
use tracing::debug;

// Every query yields the same column set so rows decode uniformly. Rows with
// no date are included; the transform stage reports and drops them.
const LESSONS_QUERY: &str = r#"
    SELECT l.id AS source_id,
           ls.day AS booking_date,
           ss.surf_club_id AS club_id,
           sp.name AS spot_name,
           l.total_price AS price,
           su.level AS surfer_level,
           l.status AS status
    FROM surf_lessons l
    LEFT JOIN surf_sessions ss ON l.surf_session_id = ss.id
    LEFT JOIN lesson_schedules ls ON ss.lesson_schedule_id = ls.id
    LEFT JOIN surf_clubs c ON ss.surf_club_id = c.id
    LEFT JOIN surf_spots sp ON c.surf_spot_id = sp.id
    LEFT JOIN surfers su ON l.surfer_id = su.id
    WHERE ls.day IS NULL OR ls.day BETWEEN ? AND ?
    ORDER BY l.id
"#;

const SESSIONS_QUERY: &str = r#"
    SELECT ss.id AS source_id,
           ls.day AS booking_date,
           ss.surf_club_id AS club_id,
           sp.name AS spot_name,
           ss.price AS price,
           NULL AS surfer_level,
           ss.status AS status
    FROM surf_sessions ss
    LEFT JOIN lesson_schedules ls ON ss.lesson_schedule_id = ls.id
    LEFT JOIN surf_clubs c ON ss.surf_club_id = c.id
    LEFT JOIN surf_spots sp ON c.surf_spot_id = sp.id
    WHERE ls.day IS NULL OR ls.day BETWEEN ? AND ?
    ORDER BY ss.id
"#;

const EQUIPMENT_ORDERS_QUERY: &str = r#"
    SELECT o.id AS source_id,
           o.order_date AS booking_date,
           o.surf_club_id AS club_id,
           sp.name AS spot_name,
           o.total_price AS price,
           su.level AS surfer_level,
           NULL AS status
    FROM equipment_orders o
    LEFT JOIN surf_clubs c ON o.surf_club_id = c.id
    LEFT JOIN surf_spots sp ON c.surf_spot_id = sp.id
    LEFT JOIN surfers su ON o.surfer_id = su.id
    WHERE o.order_date IS NULL OR o.order_date BETWEEN ? AND ?
    ORDER BY o.id
"#;

/// Reads lessons, sessions and equipment orders from the booking database.
pub struct SqliteBookingSource {
    db: Database,
}

impl SqliteBookingSource {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn decode(kind: SourceKind, row: &SqliteRow) -> Result<RawBookingRecord> {
        // Unparseable dates and prices are treated as absent.
        let date: Option<String> = row.try_get("booking_date")?;
        let price: Option<String> = row.try_get("price")?;
        Ok(RawBookingRecord {
            source_id: row.try_get("source_id")?,
            kind,
            date: date.and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
            club_id: row.try_get("club_id")?,
            spot_name: row.try_get("spot_name")?,
            price: price.and_then(|p| Decimal::from_str(p.trim()).ok()),
            surfer_level: row.try_get("surfer_level")?,
            status: row.try_get("status")?,
        })
    }
}

#[async_trait]
impl BookingSource for SqliteBookingSource {
    async fn fetch(&self, kind: SourceKind, range: DateRange) -> Result<Vec<RawBookingRecord>> {
        let sql = match kind {
            SourceKind::Lesson => LESSONS_QUERY,
            SourceKind::Session => SESSIONS_QUERY,
            SourceKind::EquipmentOrder => EQUIPMENT_ORDERS_QUERY,
            SourceKind::Synthetic => return Ok(Vec::new()),
        };

        let rows = sqlx::query(sql)
            .bind(range.start.to_string())
            .bind(range.end.to_string())
            .fetch_all(&self.db.pool)
            .await
            .with_context(|| format!("Failed to query {} records", kind))?;

        let records = rows
            .iter()
            .map(|row| Self::decode(kind, row))
            .collect::<Result<Vec<_>>>()?;
        debug!("Fetched {} {} rows", records.len(), kind);
        Ok(records)
    }
}
