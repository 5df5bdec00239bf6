use std::sync::Arc;

use caseforge_core::job::JobTable;

use crate::config::ServerConfig;
use crate::engine::dispatcher::JobDispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Process-wide job status table (read by the status endpoint).
    pub jobs: Arc<JobTable>,
    /// Job dispatcher (used by the submission endpoint).
    pub dispatcher: Arc<JobDispatcher>,
}
