use crate::cli::ServeArgs;
use crate::infra::{load_snapshot, AppState};
use crate::routes::with_scoring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ctam_scoring::config::AppConfig;
use ctam_scoring::error::AppError;
use ctam_scoring::scoring::ScoringService;
use ctam_scoring::telemetry;
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

    let snapshot = Arc::new(load_snapshot(config.scoring.snapshot_dir.as_deref())?);
    let rules = config.scoring.rules.clone();
    let scoring_service = Arc::new(
        ScoringService::new(snapshot, rules.clone())
            .with_default_fiscal_year(config.scoring.default_fiscal_year),
    );

    let app = with_scoring_routes(scoring_service)
        .layer(Extension(Arc::new(rules)))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        table = %config.scoring.rules.quality_table.version,
        "ctam scoring service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
