use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cropcast_core::ingest::source::{CsvDirectorySource, SeriesSource};
use cropcast_core::service::{ForecastService, NoiseSeed};
use cropcast_core::storage::SeriesStore;

mod report;

use report::{ReportKind, ReportRequest};

#[derive(Debug, Parser)]
#[command(name = "cropcast_worker")]
struct Args {
    /// Directory of per-commodity CSV files. Defaults to CROPCAST_DATA_DIR, then `static`.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ReportKind::Market)]
    report: ReportKind,

    /// Commodity name for the `forecast` and `summary` reports (case-insensitive).
    #[arg(long)]
    commodity: Option<String>,

    /// First month before the forecast window (1-12). Defaults to the current month.
    #[arg(long)]
    start_month: Option<i64>,

    /// Months to forecast (6-12). Defaults to 6.
    #[arg(long)]
    horizon: Option<i64>,

    /// Entries in top/bottom reports (1-10). Defaults to 5.
    #[arg(long)]
    limit: Option<i64>,

    /// Fixed noise seed for reproducible output. Defaults to CROPCAST_SEED, then entropy.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = cropcast_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let data_dir = args.data_dir.clone().unwrap_or_else(|| settings.data_dir());
    let seed = match args.seed {
        Some(seed) => NoiseSeed::Fixed(seed),
        None => settings.noise_seed()?,
    };

    let source = CsvDirectorySource::new(&data_dir);
    let loaded = source.load_all().await;
    let load_report = match loaded {
        Ok(report) => report,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(dir = %data_dir.display(), error = %err, "data load failed");
            return Err(err);
        }
    };

    let skipped = load_report.skipped.clone();
    let store = Arc::new(SeriesStore::from_report(load_report));
    let service = ForecastService::new(store, seed);

    let request = ReportRequest {
        kind: args.report,
        commodity: args.commodity.clone(),
        start_month: args.start_month,
        horizon: args.horizon,
        limit: args.limit,
    };

    let value = match report::build(&service, &skipped, &request, chrono::Utc::now()) {
        Ok(value) => value,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(report = ?request.kind, error = %err, "report failed");
            return Err(err);
        }
    };

    let rendered = serde_json::to_string_pretty(&value)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!(report = ?request.kind, path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn init_sentry(settings: &cropcast_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
