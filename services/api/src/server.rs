use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryCandidateCatalog, InMemorySessionRepository};
use crate::routes::with_session_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hanger_selector::config::AppConfig;
use hanger_selector::error::AppError;
use hanger_selector::telemetry;
use hanger_selector::workflows::session::SelectorSessionService;
use std::sync::atomic::Ordering;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let session_service = Arc::new(SelectorSessionService::new(
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(InMemoryCandidateCatalog),
        &config.selector,
    ));

    let app = with_session_routes(session_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        default_jurisdiction = %config.selector.default_jurisdiction,
        search_timeout_ms = config.selector.search_timeout.as_millis() as u64,
        "hanger selector ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
