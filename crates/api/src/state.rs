use std::sync::Arc;

use basin_core::workspace::RunWorkspace;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: sqlx::PgPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Run-scoped path resolver rooted at the configured results root.
    pub fn workspace(&self) -> RunWorkspace {
        RunWorkspace::new(&self.config.results_root)
    }
}
