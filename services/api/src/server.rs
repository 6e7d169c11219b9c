use crate::cli::ServeArgs;
use crate::infra::{cors_layer, AppState};
use crate::routes::with_api_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use portfolio::config::AppConfig;
use portfolio::contacts::{ChannelNotifier, ContactRepository, ContactService};
use portfolio::error::AppError;
use portfolio::status_checks::StatusCheckService;
use portfolio::{store, telemetry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = store::connect(&config.store).await?;
    ContactRepository::new(store.clone()).ensure_indexes().await?;
    info!(
        backend = store.backend(),
        database = %config.store.database,
        "document store connected"
    );

    let (notifier, worker) = ChannelNotifier::channel(config.notifications.queue_capacity);
    let worker = tokio::spawn(worker.run());

    let contacts = Arc::new(ContactService::new(store.clone(), Arc::new(notifier)));
    let status_checks = Arc::new(StatusCheckService::new(store.clone()));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_api_routes(contacts, status_checks, store.clone())
        .layer(Extension(app_state))
        .layer(cors_layer(&config.server))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "portfolio api ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    readiness_flag.store(false, Ordering::Release);

    // The router owned the last notifier handle, so the worker drains and exits.
    match worker.await {
        Ok(delivered) => info!(delivered, "notification worker stopped"),
        Err(err) => warn!(error = %err, "notification worker did not finish cleanly"),
    }

    store.close().await?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
