use std::sync::Arc;

use crate::services::api::RemoteApi;
use crate::services::dashboard::Dashboard;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
    pub api: Arc<dyn RemoteApi>,
}

impl AppState {
    /// Both handles talk to the same remote API.
    pub fn new(api: Arc<dyn RemoteApi>, dashboard: Dashboard) -> Self {
        Self { dashboard, api }
    }
}
