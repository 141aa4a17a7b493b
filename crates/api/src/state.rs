use std::sync::Arc;

use club_db::AccessorManager;
use club_remote::RemoteServiceClient;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; nothing in here is mutated per request.
#[derive(Clone)]
pub struct AppState {
    /// Opens one transaction-bound accessor per request.
    pub accessors: AccessorManager,
    /// Service discovery and student-directory lookups.
    pub remote: Arc<dyn RemoteServiceClient>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Cancelled when the server starts shutting down; every request
    /// observes a child of it.
    pub shutdown: CancellationToken,
}
