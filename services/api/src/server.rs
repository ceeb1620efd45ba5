use crate::catalog::{catalog_router, CatalogState};
use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryStore};
use crate::routes::with_delivery_fee_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use delivery_fee::config::{AppConfig, IngestionConfig, TariffConfig};
use delivery_fee::error::AppError;
use delivery_fee::fees::DeliveryFeeCalculator;
use delivery_fee::ingestion::{FeedClient, WeatherIngestor};
use delivery_fee::tariffs::TariffCatalog;
use delivery_fee::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryStore::new(load_tariffs(&config.tariffs)?));
    let feed = FeedClient::new(config.ingestion.feed_url.clone());
    if config.ingestion.enabled {
        spawn_ingestion(&config.ingestion, feed.clone(), store.clone());
    } else {
        info!("scheduled weather ingestion disabled");
    }

    let catalog = catalog_router(CatalogState::new(store.clone(), feed));
    let calculator = Arc::new(DeliveryFeeCalculator::new(store.clone(), store));
    let app = with_delivery_fee_routes(calculator)
        .merge(catalog)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "delivery fee service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Built-in tables unless all three CSV overrides are configured.
pub(crate) fn load_tariffs(config: &TariffConfig) -> Result<TariffCatalog, AppError> {
    let catalog = match (&config.cities_csv, &config.base_fees_csv, &config.rules_csv) {
        (Some(cities), Some(base_fees), Some(rules)) => {
            info!(cities = %cities.display(), "loading tariff tables from disk");
            TariffCatalog::from_paths(cities, base_fees, rules)?
        }
        _ => TariffCatalog::builtin()?,
    };
    Ok(catalog)
}

/// Polls the feed on a fixed interval. The first pass runs immediately; failed passes are
/// logged and retried on the next tick.
fn spawn_ingestion(config: &IngestionConfig, client: FeedClient, store: Arc<InMemoryStore>) {
    let ingestor = WeatherIngestor::new(store.clone(), store);
    let period = config.interval;

    info!(
        url = client.url(),
        interval_secs = period.as_secs(),
        "scheduling weather ingestion"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(err) = ingestor.refresh(&client).await {
                warn!(error = %err, url = client.url(), "weather ingestion failed");
            }
        }
    });
}
