//! HTTP prediction service.
//!
//! A thin axum adapter around one loaded [`Pipeline`](crate::Pipeline):
//!
//! * `GET /` - liveness probe
//! * `GET /predict` - usage message
//! * `POST /predict` - split-orient JSON table in, `{"predictions": [...]}` out
//! * `GET /info` - fitted pipeline summary
//! * `POST /reload` - re-read the artifact and swap it in atomically

mod frame;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::info;

pub use frame::{FrameError, SplitFrame};
pub use handlers::{PredictResponse, ServerError, HEALTH_MESSAGE, PREDICT_USAGE_MESSAGE};
pub use state::ModelHandle;

/// Largest accepted request body. Split-orient batches routinely exceed
/// axum's 2 MB default.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Shared, read-only application state injected into every handler.
#[derive(Debug)]
pub struct AppState {
    pub model: ModelHandle,
}

impl AppState {
    pub fn new(model: ModelHandle) -> Arc<Self> {
        Arc::new(Self { model })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub artifact_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            artifact_path: PathBuf::from("artifacts/model.bin"),
        }
    }
}

/// Build the axum [`Router`] with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::health_handler))
        .route(
            "/predict",
            get(handlers::predict_usage_handler).post(handlers::predict_handler),
        )
        .route("/info", get(handlers::info_handler))
        .route("/reload", post(handlers::reload_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Loads the artifact once, then serves until ctrl-c.
///
/// # Errors
///
/// Fails at startup if the artifact cannot be loaded or the address cannot be bound.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let path = config.artifact_path.clone();
    let model = tokio::task::spawn_blocking(move || ModelHandle::load(path)).await??;
    let pipeline_info = model.current().await.info();
    info!(
        "Loaded pipeline from {:?}: {} features, classes {:?}",
        config.artifact_path, pipeline_info.n_features, pipeline_info.classes
    );

    let app = build_router(AppState::new(model));
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("Prediction server listening on {}", config.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Prediction server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
