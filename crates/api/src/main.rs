use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cropcast_core::ingest::source::{CsvDirectorySource, SeriesSource};
use cropcast_core::storage::handle::StoreHandle;
use cropcast_core::storage::SeriesStore;

mod routes;

use routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = cropcast_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let seed = settings.noise_seed()?;
    let source = CsvDirectorySource::from_settings(&settings);

    let store = match source.load_all().await {
        Ok(report) => SeriesStore::from_report(report),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(
                error = %e,
                dir = %source.dir().display(),
                "initial load failed; starting API with an empty store"
            );
            SeriesStore::default()
        }
    };

    let state = AppState {
        store: Arc::new(StoreHandle::new(store)),
        source: Arc::new(source),
        seed,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(routes::root))
        .route("/healthz", get(routes::healthz))
        .route("/health", get(routes::health))
        .route("/commodities", get(routes::list_commodities))
        .route("/predict/:name", get(routes::predict))
        .route("/forecast", get(routes::forecast_all))
        .route("/commodity-info/:name", get(routes::commodity_info))
        .route("/top-performers", get(routes::top_performers))
        .route("/bottom-performers", get(routes::bottom_performers))
        .route("/market-analysis", get(routes::market_analysis))
        .route("/admin/reload", post(routes::reload))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let port = settings.port()?;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
