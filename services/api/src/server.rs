use crate::cli::ServeArgs;
use crate::infra::{seed_demo_listings, AppState, InMemoryMarketplaceStore, LoggingNotificationPublisher};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use stayhub::config::AppConfig;
use stayhub::error::AppError;
use stayhub::marketplace::MarketplaceService;
use stayhub::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if args.seed_demo {
        config.marketplace.seed_demo_data = true;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryMarketplaceStore::default());
    if config.marketplace.seed_demo_data {
        let seeded = seed_demo_listings(&store)?;
        info!(listings = seeded, "seeded demo listings");
    }
    let notifications = Arc::new(LoggingNotificationPublisher::default());
    let service = Arc::new(MarketplaceService::new(store, notifications));

    let app = with_marketplace_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "stayhub marketplace ready");

    axum::serve(listener, app).await?;
    Ok(())
}
