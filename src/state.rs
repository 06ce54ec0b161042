//! Shared handler state.

use std::sync::Arc;

use crate::{config::ServiceConfig, session::SessionStore, storage::Workspace};

/// Shared application state available to all axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable; the inner data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Registry of live sessions.
    pub store: Arc<SessionStore>,
    /// On-disk layout for uploads and frames.
    pub workspace: Arc<Workspace>,
    /// Service configuration.
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Bundle the collaborators for the router.
    pub fn new(config: ServiceConfig, workspace: Workspace) -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            workspace: Arc::new(workspace),
            config: Arc::new(config),
        }
    }
}
