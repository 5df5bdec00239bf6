use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use caseforge_api::config::{ServerConfig, StorageBackend};
use caseforge_api::engine::dispatcher::JobDispatcher;
use caseforge_api::router::build_app_router;
use caseforge_api::state::AppState;
use caseforge_bedrock::{ImageGenerator, NovaCanvasClient};
use caseforge_core::job::JobTable;
use caseforge_storage::{LocalObjectStore, MemoryObjectStore, ObjectStore, S3ObjectStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caseforge_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Object store ---
    let store = build_object_store(&config).await;

    // --- Generation backend ---
    let generator: Arc<dyn ImageGenerator> =
        Arc::new(NovaCanvasClient::from_env(config.model_id.clone()).await);
    tracing::info!(model_id = %config.model_id, "Nova Canvas client ready");

    // --- Job engine ---
    let jobs = Arc::new(JobTable::new());
    let dispatcher = Arc::new(JobDispatcher::new(
        Arc::clone(&jobs),
        generator,
        store,
        config.max_concurrent_jobs,
        Duration::from_secs(config.generation_timeout_secs),
    ));
    tracing::info!(
        max_concurrent_jobs = config.max_concurrent_jobs,
        generation_timeout_secs = config.generation_timeout_secs,
        "Job dispatcher ready",
    );

    // --- App state / router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        jobs,
        dispatcher: Arc::clone(&dispatcher),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!(
        in_flight = dispatcher.in_flight(),
        "Server stopped accepting connections, draining in-flight jobs",
    );

    let drain = dispatcher.shutdown();
    if tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), drain)
        .await
        .is_err()
    {
        tracing::warn!(
            in_flight = dispatcher.in_flight(),
            "Drain timeout elapsed with jobs still running; abandoning them",
        );
    }

    tracing::info!("Graceful shutdown complete");
}

/// Construct the configured object store backend.
async fn build_object_store(config: &ServerConfig) -> Arc<dyn ObjectStore> {
    match config.storage_backend {
        StorageBackend::Local => {
            tracing::info!(root = %config.storage_root, "Using local object store");
            Arc::new(LocalObjectStore::new(config.storage_root.clone()))
        }
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .expect("S3_BUCKET must be set when STORAGE_BACKEND=s3");
            let aws_config =
                aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            let client = aws_sdk_s3::Client::new(&aws_config);
            tracing::info!(bucket = %bucket, "Using S3 object store");
            Arc::new(S3ObjectStore::new(client, bucket))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object store; images will not survive a restart");
            Arc::new(MemoryObjectStore::new())
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
