use crate::cli::ServeArgs;
use crate::infra::{in_memory_service, AppState};
use crate::routes::with_rule_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use payment_rules::config::AppConfig;
use payment_rules::error::AppError;
use payment_rules::rules::load_catalog;
use payment_rules::telemetry;
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
    if let Some(catalog) = args.catalog.take() {
        config.rules.catalog_path = Some(catalog);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let rule_service = Arc::new(in_memory_service());
    if let Some(path) = &config.rules.catalog_path {
        let seeded = rule_service.seed(load_catalog(path)?)?;
        info!(path = %path.display(), rules = seeded, "payment rule catalog loaded");
    }

    let app = with_rule_routes(rule_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "payment rules service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
