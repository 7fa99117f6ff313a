//! Route modules.

use axum::Router;
use chrono::{DateTime, Utc};
use relay_core::notify::ReportPage;
use relay_core::participant::Participant;
use relay_game::application::outcomes::{Finalization, TurnAssigned};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod admin;
pub mod health;
pub mod relay;

/// Response body for a turn that was just assigned.
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    /// The new holder.
    pub holder: Participant,
    /// When their turn expires.
    pub deadline: DateTime<Utc>,
}

impl From<TurnAssigned> for TurnResponse {
    fn from(assigned: TurnAssigned) -> Self {
        Self {
            holder: assigned.holder,
            deadline: assigned.deadline,
        }
    }
}

/// Response body for a finalized game.
#[derive(Debug, Serialize)]
pub struct FinalizationResponse {
    /// Whether the report reached its destination.
    pub delivered: bool,
    /// Name of the archived ledger, if archival succeeded.
    pub archive: Option<String>,
    /// Paginated report. Empty when the chain was empty.
    pub pages: Vec<ReportPage>,
}

impl From<Finalization> for FinalizationResponse {
    fn from(finalization: Finalization) -> Self {
        Self {
            delivered: finalization.delivered,
            archive: finalization.archive.map(|id| id.0),
            pages: finalization.report.map(|r| r.pages).unwrap_or_default(),
        }
    }
}

/// Builds the full router. Shared by the binary and the integration tests.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/relay", relay::router())
        .nest("/api/v1/admin", admin::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
