use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use talent_relay::analysis::{AnalysisService, HeuristicScorer};
use talent_relay::config::{AppConfig, ConfigError};
use talent_relay::connectors::http_client;
use talent_relay::error::AppError;
use talent_relay::status::StatusUpdater;
use talent_relay::sync::SyncService;
use talent_relay::telemetry;
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

    let client = http_client(config.fetch.request_timeout)?;
    let mut service = AnalysisService::new(HeuristicScorer::default());
    match StatusUpdater::from_settings(client, &config.sources.bamboohr) {
        Ok(updater) => {
            service = service.with_status_updater(updater);
            info!("BambooHR status updates enabled");
        }
        Err(ConfigError::MissingCredential { key }) => {
            warn!(%key, "BambooHR status updates disabled");
        }
        Err(err) => return Err(err.into()),
    }
    let service = Arc::new(service.apply_transitions_on_analyze(args.apply_status_updates));
    let sync = Arc::new(SyncService::from_config(&config)?);

    let app = with_service_routes(service, sync)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "talent relay analysis service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
