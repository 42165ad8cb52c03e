use crate::cli::ServeArgs;
use crate::infra::{AppState, HttpControlService, InMemorySessionStore};
use crate::routes::with_control_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use servicedesk::config::AppConfig;
use servicedesk::error::AppError;
use servicedesk::telemetry;
use servicedesk::workflows::control::{ControlWorkflowService, ServiceDeskHttpClient};
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

    let store = Arc::new(InMemorySessionStore::default());
    let gateway = Arc::new(ServiceDeskHttpClient::new(config.upstream.base_url.clone()));
    let control_service: Arc<HttpControlService> = Arc::new(ControlWorkflowService::new(
        store.clone(),
        gateway.clone(),
        gateway,
    ));

    let app = with_control_routes(control_service)
        .layer(Extension(app_state))
        .layer(Extension(store))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        upstream = %config.upstream.base_url,
        "service-desk control API ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
