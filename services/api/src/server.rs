use crate::cli::ServeArgs;
use crate::infra::{AppState, Discovery, InMemorySessionStore};
use crate::routes::with_discovery_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use scheme_mitra::ai::{AzureOpenAiClient, TextAnalyticsClient};
use scheme_mitra::config::AppConfig;
use scheme_mitra::error::AppError;
use scheme_mitra::schemes::CatalogHandle;
use scheme_mitra::telemetry;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dataset) = args.dataset.take() {
        config.dataset.path = dataset;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    // A load failure degrades the listing to empty with a notice; it never
    // stops the service.
    let catalog = CatalogHandle::load(&config.dataset.path);

    let generator = AzureOpenAiClient::new(config.openai.clone())?;
    if !generator.is_configured() {
        warn!("azure openai credentials missing; eligibility explanations will degrade");
    }
    let analytics = TextAnalyticsClient::new(config.analytics.clone())?;

    let service = Arc::new(Discovery::new(
        catalog,
        Arc::new(generator),
        analytics,
        Arc::new(InMemorySessionStore::default()),
    ));

    let app = with_discovery_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "scheme discovery service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
