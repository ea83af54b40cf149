use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Schema of the booking system, in creation order.
///
/// Dates are ISO `YYYY-MM-DD` text and prices are decimal text. Links stay
/// nullable because the ETL reports orphaned rows instead of rejecting them.
const SCHEMA: &[(&str, &str)] = &[
    (
        "surf_spots",
        r#"
        CREATE TABLE IF NOT EXISTS surf_spots (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );
        "#,
    ),
    (
        "surf_clubs",
        r#"
        CREATE TABLE IF NOT EXISTS surf_clubs (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            surf_spot_id INTEGER REFERENCES surf_spots(id)
        );
        "#,
    ),
    (
        "surfers",
        r#"
        CREATE TABLE IF NOT EXISTS surfers (
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            level TEXT DEFAULT 'beginner'
        );
        "#,
    ),
    (
        "lesson_schedules",
        r#"
        CREATE TABLE IF NOT EXISTS lesson_schedules (
            id INTEGER PRIMARY KEY,
            surf_club_id INTEGER REFERENCES surf_clubs(id),
            day TEXT,
            start_time TEXT,
            end_time TEXT
        );
        "#,
    ),
    (
        "surf_sessions",
        r#"
        CREATE TABLE IF NOT EXISTS surf_sessions (
            id INTEGER PRIMARY KEY,
            surf_club_id INTEGER REFERENCES surf_clubs(id),
            lesson_schedule_id INTEGER REFERENCES lesson_schedules(id),
            price TEXT,
            status TEXT
        );
        "#,
    ),
    (
        "surf_lessons",
        r#"
        CREATE TABLE IF NOT EXISTS surf_lessons (
            id INTEGER PRIMARY KEY,
            surfer_id INTEGER REFERENCES surfers(id),
            surf_session_id INTEGER REFERENCES surf_sessions(id),
            total_price TEXT,
            status TEXT
        );
        "#,
    ),
    (
        "equipment_orders",
        r#"
        CREATE TABLE IF NOT EXISTS equipment_orders (
            id INTEGER PRIMARY KEY,
            surfer_id INTEGER REFERENCES surfers(id),
            surf_club_id INTEGER REFERENCES surf_clubs(id),
            order_date TEXT,
            total_price TEXT
        );
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_lesson_schedules_day ON lesson_schedules (day);",
    "CREATE INDEX IF NOT EXISTS idx_equipment_orders_date ON equipment_orders (order_date);",
];

/// Connection pool to the booking database
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        for (table, ddl) in SCHEMA {
            sqlx::query(*ddl)
                .execute(&mut *conn)
                .await
                .with_context(|| format!("Failed to create {} table", table))?;
        }
        for ddl in INDEXES {
            sqlx::query(*ddl)
                .execute(&mut *conn)
                .await
                .context("Failed to create index")?;
        }

        info!("Database schema initialized");
        Ok(())
    }
}
