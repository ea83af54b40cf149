use anyhow::Result;
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use surfcast::application::etl::{Extractor, Transformer};
use surfcast::application::ml::{ArtifactStore, ModelSettings, ModelTrainer, PredictionService, TrainingPlan};
use surfcast::application::pipeline::BookingPipeline;
use surfcast::domain::ports::BookingSource;
use surfcast::domain::records::{DateRange, RawBookingRecord, SourceKind};
use surfcast::domain::weather::WeatherConditions;
use surfcast::infrastructure::observability::PipelineMetrics;
use surfcast::infrastructure::{
    Database, FileArtifactStore, InMemoryArtifactStore, InMemoryBookingSource,
    SqliteBookingSource, StaticWeatherProvider,
};

const SPOTS: [&str; 5] = ["Taghazout", "Agadir", "Essaouira", "Bouznika", "Imsouane"];

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

fn history(count: usize) -> Vec<RawBookingRecord> {
    let kinds = [
        SourceKind::Lesson,
        SourceKind::Session,
        SourceKind::EquipmentOrder,
    ];
    (0..count)
        .map(|i| RawBookingRecord {
            source_id: i as i64 + 1,
            kind: kinds[i % kinds.len()],
            date: as_of().checked_sub_days(Days::new((i as u64 * 7) % 300)),
            club_id: Some((i % 4) as i64 + 1),
            spot_name: Some(SPOTS[i % SPOTS.len()].to_string()),
            price: Some(dec!(80) + Decimal::from((i % 5) as i64 * 10)),
            surfer_level: Some(if i % 2 == 0 { "beginner" } else { "intermediate" }.to_string()),
            status: Some(if i % 4 == 0 { "cancelled" } else { "confirmed" }.to_string()),
        })
        .collect()
}

fn pipeline(source: Arc<dyn BookingSource>, store: Arc<dyn ArtifactStore>) -> BookingPipeline {
    BookingPipeline::new(
        Extractor::new(source),
        Transformer::new(Arc::new(StaticWeatherProvider::new()), Duration::from_secs(5)),
        ModelTrainer::new(ModelSettings::default()),
        store,
        TrainingPlan::default(),
    )
}

#[tokio::test]
async fn test_full_pipeline_trains_and_persists() {
    let mut records = history(90);
    records[5].date = None;
    records[6].club_id = None;
    let source = Arc::new(InMemoryBookingSource::new(records));
    let store = Arc::new(InMemoryArtifactStore::new());
    let metrics = PipelineMetrics::new().unwrap();
    let pipeline = pipeline(source, store.clone()).with_metrics(metrics.clone());

    let report = pipeline.run_full_pipeline_as_of(365, as_of()).await;
    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.stats.raw_records, 90);
    assert_eq!(report.stats.transformed_records, 88);
    assert_eq!(report.stats.dropped_records, 2);
    assert_eq!(report.stats.days_covered, 365);
    // Imsouane has no climatology
    assert!(report.stats.weather_fallbacks > 0);
    assert_eq!(report.training_results.len(), 3);
    assert!(report.training_results.iter().all(|r| r.success && r.error.is_none()));

    let bundle = store.load().unwrap().unwrap();
    assert!(bundle.is_complete());
    assert!(metrics.render().contains("surfcast_training_runs_total"));
}

#[tokio::test]
async fn test_full_pipeline_is_idempotent() {
    let source = Arc::new(InMemoryBookingSource::new(history(60)));
    let pipeline = pipeline(source, Arc::new(InMemoryArtifactStore::new()));

    let first = pipeline.run_full_pipeline_as_of(365, as_of()).await;
    let second = pipeline.run_full_pipeline_as_of(365, as_of()).await;
    assert!(first.success);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_empty_history_reports_no_data() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let pipeline = pipeline(Arc::new(InMemoryBookingSource::default()), store.clone());

    let report = pipeline.run_full_pipeline_as_of(30, as_of()).await;
    assert!(!report.success);
    assert!(report.error.as_deref().is_some_and(|e| e.starts_with("No data")));
    assert_eq!(report.stats.raw_records, 0);
    assert_eq!(report.stats.days_covered, 30);
    assert!(report.training_results.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_records_outside_window_are_ignored() {
    let source = Arc::new(InMemoryBookingSource::new(history(40)));
    let pipeline = pipeline(source, Arc::new(InMemoryArtifactStore::new()));

    // 40 records spaced a week apart; a 70-day window sees the 11 most recent
    let report = pipeline.run_full_pipeline_as_of(70, as_of()).await;
    assert_eq!(report.stats.raw_records, 11);
}

struct BrokenSource;

#[async_trait]
impl BookingSource for BrokenSource {
    async fn fetch(&self, _kind: SourceKind, _range: DateRange) -> Result<Vec<RawBookingRecord>> {
        anyhow::bail!("database is locked")
    }
}

#[tokio::test]
async fn test_extraction_failure_is_reported() {
    let pipeline = pipeline(Arc::new(BrokenSource), Arc::new(InMemoryArtifactStore::new()));
    let report = pipeline.run_full_pipeline_as_of(30, as_of()).await;
    assert!(!report.success);
    let error = report.error.unwrap();
    assert!(error.contains("lesson"), "{}", error);
    assert!(error.contains("database is locked"), "{}", error);
}

#[tokio::test]
async fn test_sqlite_pipeline_end_to_end() {
    let dir = std::env::temp_dir().join(format!(
        "surfcast_flow_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let db = Database::new(&format!("sqlite://{}", dir.join("bookings.db").display()))
        .await
        .unwrap();

    for (id, name) in SPOTS.iter().enumerate().take(4) {
        sqlx::query("INSERT INTO surf_spots (id, name) VALUES (?, ?)")
            .bind(id as i64 + 1)
            .bind(*name)
            .execute(&db.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO surf_clubs (id, name, surf_spot_id) VALUES (?, ?, ?)")
            .bind(id as i64 + 1)
            .bind(format!("{} Surf Club", name))
            .bind(id as i64 + 1)
            .execute(&db.pool)
            .await
            .unwrap();
    }
    sqlx::query("INSERT INTO surfers (id, first_name, last_name, level) VALUES (1, 'Nora', 'Alaoui', 'beginner')")
        .execute(&db.pool)
        .await
        .unwrap();
    for i in 0..40_i64 {
        let day = as_of()
            .checked_sub_days(Days::new((i as u64) * 5))
            .unwrap()
            .to_string();
        let club = i % 4 + 1;
        sqlx::query("INSERT INTO lesson_schedules (id, surf_club_id, day) VALUES (?, ?, ?)")
            .bind(i + 1)
            .bind(club)
            .bind(&day)
            .execute(&db.pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO surf_sessions (id, surf_club_id, lesson_schedule_id, price, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(i + 1)
        .bind(club)
        .bind(i + 1)
        .bind(format!("{}.00", 40 + (i % 3) * 5))
        .bind(if i % 5 == 0 { "cancelled" } else { "confirmed" })
        .execute(&db.pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO surf_lessons (id, surfer_id, surf_session_id, total_price, status) VALUES (?, 1, ?, ?, ?)",
        )
        .bind(i + 1)
        .bind(i + 1)
        .bind(format!("{}.50", 90 + (i % 4) * 10))
        .bind(if i % 3 == 0 { "cancelled" } else { "confirmed" })
        .execute(&db.pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO equipment_orders (id, surfer_id, surf_club_id, order_date, total_price) VALUES (?, 1, ?, ?, '30.00')",
        )
        .bind(i + 1)
        .bind(club)
        .bind(&day)
        .execute(&db.pool)
        .await
        .unwrap();
    }

    let store = Arc::new(FileArtifactStore::new(dir.join("ml").join("booking_models.json")));
    let pipeline = pipeline(Arc::new(SqliteBookingSource::new(db)), store.clone())
        .with_dataset_export(dir.join("dataset.csv"));

    let report = pipeline.run_full_pipeline_as_of(730, as_of()).await;
    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.stats.raw_records, 120);
    assert_eq!(report.stats.transformed_records, 120);
    assert_eq!(report.stats.weather_fallbacks, 0);
    assert!(dir.join("dataset.csv").exists());

    let service = PredictionService::from_store(store.as_ref()).unwrap();
    let prediction = service
        .predict_demand(
            as_of(),
            &WeatherConditions::new(1.8, 12.0, 21.0),
            Some("Taghazout"),
        )
        .unwrap();
    assert!(prediction.predicted_demand >= 0.0);

    let _ = std::fs::remove_dir_all(dir);
}
