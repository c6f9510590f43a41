use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryVerificationRepository};
use crate::routes::with_appraisal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use titlesplit::appraisal::AppraisalService;
use titlesplit::config::AppConfig;
use titlesplit::error::AppError;
use titlesplit::telemetry;
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

    let repository = Arc::new(InMemoryVerificationRepository::default());
    let engine_config = Arc::new(config.engine.clone());
    let appraisal_service = Arc::new(AppraisalService::new(repository, engine_config));

    let app = with_appraisal_routes(appraisal_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        gdv_floor = config.engine.sanity.gdv_floor.enabled,
        "title split appraiser ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
