use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use surfcast::application::etl::{
    Extractor, TrainingDataset, Transformer, quality_check, read_rows_csv,
};
use surfcast::application::ml::{ModelTrainer, PredictionService};
use surfcast::application::outlook::DemandOutlook;
use surfcast::application::pipeline::{
    BookingPipeline, PipelineReport, PipelineStats, train_and_persist,
};
use surfcast::application::synthetic::{DEFAULT_WINDOW_DAYS, SyntheticGenerator};
use surfcast::config::{Config, load_training_plan};
use surfcast::domain::ports::WeatherProvider;
use surfcast::infrastructure::observability::PipelineMetrics;
use surfcast::infrastructure::{
    Database, FileArtifactStore, SqliteBookingSource, StaticWeatherProvider,
    UnavailableWeatherProvider,
};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WeatherSourceArg {
    /// Per-spot climatology
    Static,
    /// No weather data; every record uses the default conditions
    None,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Train surf booking demand, price and cancellation models", long_about = None)]
struct Args {
    /// Train on N synthetic records instead of the booking database
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed of the synthetic generator
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Days of history to read (defaults to PIPELINE_LOOKBACK_DAYS)
    #[arg(long)]
    lookback_days: Option<u32>,

    /// Weather enrichment for historical records
    #[arg(long, value_enum, default_value_t = WeatherSourceArg::Static)]
    weather: WeatherSourceArg,

    /// Model bundle path (defaults to ARTIFACT_PATH)
    #[arg(long)]
    output: Option<PathBuf>,

    /// TOML file with per-task algorithms (defaults to TRAINING_PLAN_PATH)
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Also export the training dataset as CSV
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Only run the data quality check on an exported CSV and exit
    #[arg(long)]
    check_csv: Option<PathBuf>,

    /// Print pipeline metrics in Prometheus text format after the run
    #[arg(long)]
    metrics: bool,

    /// After a successful run, print the demand outlook for this spot
    #[arg(long)]
    outlook: Option<String>,

    /// Number of forecast days in the outlook
    #[arg(long, default_value_t = 7)]
    outlook_days: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();
    info!("surfcast-train {} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(path) = &args.check_csv {
        let rows = read_rows_csv(path)?;
        let report = quality_check(&rows);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = &args.plan {
        config.training_plan = load_training_plan(path)?;
    }
    let artifact_path = args
        .output
        .clone()
        .unwrap_or_else(|| config.storage.artifact_path.clone());
    let store = Arc::new(
        FileArtifactStore::new(artifact_path)
            .with_keep_versions(config.storage.artifact_keep_versions),
    );
    let trainer = ModelTrainer::new(config.model.settings());
    let metrics = PipelineMetrics::new()?;
    let weather: Arc<dyn WeatherProvider> = match args.weather {
        WeatherSourceArg::Static => Arc::new(StaticWeatherProvider::new()),
        WeatherSourceArg::None => Arc::new(UnavailableWeatherProvider),
    };

    let report = match args.synthetic {
        Some(0) => bail!("--synthetic needs at least one record"),
        Some(count) => {
            info!("Generating {} synthetic records (seed {})", count, args.seed);
            let records =
                SyntheticGenerator::new(args.seed, Utc::now().date_naive()).generate(count);
            let dataset = TrainingDataset::load(records)?;
            if let Some(path) = &args.export_csv {
                dataset.write_csv(path)?;
            }
            let stats = PipelineStats {
                raw_records: count,
                transformed_records: dataset.len(),
                days_covered: DEFAULT_WINDOW_DAYS,
                ..PipelineStats::default()
            };
            let result = train_and_persist(
                &trainer,
                &config.training_plan,
                store.as_ref(),
                Some(&metrics),
                &dataset,
            );
            PipelineReport::from_result(stats, result)
        }
        None => {
            let db = Database::new(&config.storage.database_url).await?;
            let mut pipeline = BookingPipeline::new(
                Extractor::new(Arc::new(SqliteBookingSource::new(db))),
                Transformer::new(weather.clone(), config.pipeline.weather_timeout()),
                trainer,
                store.clone(),
                config.training_plan.clone(),
            )
            .with_metrics(metrics.clone());
            if let Some(path) = &args.export_csv {
                pipeline = pipeline.with_dataset_export(path.clone());
            }
            let lookback = args.lookback_days.unwrap_or(config.pipeline.lookback_days);
            pipeline.run_full_pipeline(lookback).await
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    if args.metrics {
        println!("{}", metrics.render());
    }

    if !report.success {
        std::process::exit(1);
    }

    if let Some(spot) = &args.outlook {
        let service = PredictionService::from_store(store.as_ref())?;
        let predictions = DemandOutlook::new(weather)
            .forecast_demand(&service, spot, args.outlook_days)
            .await?;
        println!("{}", serde_json::to_string_pretty(&predictions)?);
    }
    Ok(())
}
