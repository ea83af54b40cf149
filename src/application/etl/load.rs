use crate::domain::errors::{DataQualityIssue, PipelineError};
use crate::domain::records::{CanonicalBookingRecord, CanonicalRow};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Text columns with more distinct values than this are flagged.
pub const MAX_CATEGORY_CARDINALITY: usize = 100;

/// Free-text columns that are expected to be unique per row.
const CARDINALITY_EXEMPT: &[&str] = &["booking_date"];

/// Outcome of the non-blocking quality check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub is_valid: bool,
    pub issues: Vec<DataQualityIssue>,
    pub total_records: usize,
    pub columns: Vec<String>,
}

/// Checks rows for missing values, high-cardinality text columns and
/// negative booking counts.
pub fn quality_check(rows: &[CanonicalRow]) -> QualityReport {
    let mut columns: Vec<String> = Vec::new();
    let mut missing: BTreeMap<String, usize> = BTreeMap::new();
    let mut distinct: BTreeMap<String, HashSet<String>> = BTreeMap::new();
    let mut negative_bookings = 0;

    for row in rows {
        if row.actual_bookings < 0 {
            negative_bookings += 1;
        }
        let Ok(Value::Object(fields)) = serde_json::to_value(row) else {
            continue;
        };
        if columns.is_empty() {
            columns = fields.keys().cloned().collect();
        }
        for (column, value) in fields {
            match value {
                Value::Null => *missing.entry(column).or_default() += 1,
                Value::String(s) if s.trim().is_empty() => {
                    *missing.entry(column).or_default() += 1
                }
                Value::String(s) if !CARDINALITY_EXEMPT.contains(&column.as_str()) => {
                    distinct.entry(column).or_default().insert(s);
                }
                Value::Number(n) if n.as_f64().is_none_or(|f| !f.is_finite()) => {
                    *missing.entry(column).or_default() += 1
                }
                _ => {}
            }
        }
    }

    let mut issues: Vec<DataQualityIssue> = missing
        .into_iter()
        .map(|(column, count)| DataQualityIssue::MissingValues { column, count })
        .collect();
    issues.extend(
        distinct
            .into_iter()
            .filter(|(_, values)| values.len() > MAX_CATEGORY_CARDINALITY)
            .map(|(column, values)| DataQualityIssue::HighCardinality {
                column,
                distinct: values.len(),
            }),
    );
    if negative_bookings > 0 {
        issues.push(DataQualityIssue::NegativeBookings {
            count: negative_bookings,
        });
    }

    for issue in &issues {
        warn!("Data quality: {}", issue);
    }

    QualityReport {
        is_valid: issues.is_empty(),
        issues,
        total_records: rows.len(),
        columns,
    }
}

/// Canonical records ready for training, with their quality report.
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    records: Vec<CanonicalBookingRecord>,
    quality: QualityReport,
}

impl TrainingDataset {
    /// Fails only when there is nothing to train on; quality issues are
    /// reported but never block loading.
    pub fn load(records: Vec<CanonicalBookingRecord>) -> Result<Self, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::NoData {
                reason: "no records were transformed".to_string(),
            });
        }
        let rows: Vec<CanonicalRow> = records.iter().map(|r| r.to_row()).collect();
        let quality = quality_check(&rows);
        info!(
            "Loaded dataset: {} records, {} quality issues",
            records.len(),
            quality.issues.len()
        );
        Ok(Self { records, quality })
    }

    pub fn records(&self) -> &[CanonicalBookingRecord] {
        &self.records
    }

    pub fn quality(&self) -> &QualityReport {
        &self.quality
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> Vec<CanonicalRow> {
        self.records.iter().map(|r| r.to_row()).collect()
    }

    /// Writes one flat row per record, with headers.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        for record in &self.records {
            wtr.serialize(record.to_row())?;
        }
        wtr.flush()?;
        info!("Exported {} rows to {}", self.records.len(), path.display());
        Ok(())
    }
}

/// Reads rows previously exported with [`TrainingDataset::write_csv`].
pub fn read_rows_csv(path: &Path) -> Result<Vec<CanonicalRow>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: CanonicalRow = result.context("Malformed dataset row")?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::records::{BookingObservation, SourceKind};
    use crate::domain::weather::{WeatherConditions, WeatherReading};
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "surfcast_load_{}_{}_{}",
            std::process::id(),
            n,
            nanos
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn record(id: i64, day: u32, spot: &str) -> CanonicalBookingRecord {
        CanonicalBookingRecord::new(BookingObservation {
            source_id: id,
            source_kind: SourceKind::Lesson,
            booking_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            weather: WeatherReading::observed(WeatherConditions::new(1.8, 12.0, 20.0)),
            actual_bookings: 1,
            base_price: 100.0,
            optimized_price: 100.0,
            price_multiplier: 1.0,
            cancellation_probability: 0.1,
            was_cancelled: false,
            spot_name: spot.to_string(),
            surf_level: "beginner".to_string(),
        })
    }

    #[test]
    fn test_load_rejects_empty() {
        let err = TrainingDataset::load(Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::NoData { .. }));
    }

    #[test]
    fn test_clean_dataset_is_valid() {
        let dataset =
            TrainingDataset::load(vec![record(1, 1, "Taghazout"), record(2, 2, "Agadir")])
                .unwrap();
        let quality = dataset.quality();
        assert!(quality.is_valid);
        assert_eq!(quality.total_records, 2);
        assert!(quality.columns.contains(&"weather_score".to_string()));
        assert!(quality.columns.contains(&"actual_bookings".to_string()));
    }

    #[test]
    fn test_quality_issues_are_reported() {
        let mut rows: Vec<CanonicalRow> = (1..=28)
            .map(|day| record(i64::from(day), day, "Taghazout").to_row())
            .collect();
        rows[0].actual_bookings = -2;
        rows[1].surf_level = String::new();
        for (i, row) in rows.iter_mut().enumerate() {
            row.spot_name = format!("spot-{}", i);
        }
        // Push the spot column past the cardinality limit
        let extra: Vec<CanonicalRow> = (0..MAX_CATEGORY_CARDINALITY)
            .map(|i| {
                let mut row = record(1000 + i as i64, 1, "x").to_row();
                row.spot_name = format!("extra-{}", i);
                row
            })
            .collect();
        rows.extend(extra);

        let report = quality_check(&rows);
        assert!(!report.is_valid);
        assert!(report.issues.contains(&DataQualityIssue::NegativeBookings { count: 1 }));
        assert!(report.issues.contains(&DataQualityIssue::MissingValues {
            column: "surf_level".to_string(),
            count: 1
        }));
        assert!(report.issues.iter().any(|i| matches!(
            i,
            DataQualityIssue::HighCardinality { column, .. } if column == "spot_name"
        )));
        // Dates are unique per row and never flagged
        assert!(!report.issues.iter().any(|i| matches!(
            i,
            DataQualityIssue::HighCardinality { column, .. } if column == "booking_date"
        )));
    }

    #[test]
    fn test_csv_export_reads_back() {
        let dir = temp_dir();
        let path = dir.join("nested").join("dataset.csv");
        let dataset =
            TrainingDataset::load(vec![record(1, 4, "Essaouira"), record(2, 5, "Bouznika")])
                .unwrap();
        dataset.write_csv(&path).unwrap();

        let rows = read_rows_csv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].spot_name, "Essaouira");
        assert_eq!(rows[1].booking_date, "2024-05-05");
        assert_eq!(rows, dataset.rows());
        let _ = std::fs::remove_dir_all(dir);
    }
}
