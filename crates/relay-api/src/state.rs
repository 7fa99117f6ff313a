//! Shared application state.

use std::sync::Arc;

use relay_game::application::service::RelayService;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The turn engine.
    pub relay: Arc<RelayService>,
    /// Token required on admin routes. `None` refuses every admin request.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(relay: Arc<RelayService>, admin_token: Option<String>) -> Self {
        Self {
            relay,
            admin_token: admin_token.map(Arc::from),
        }
    }
}
