//! Operator routes. Guarded by the `x-admin-token` header; with no token
//! configured every privileged request is refused.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{post, put};
use axum::{Json, Router};
use relay_core::command::Command;
use relay_core::participant::ParticipantId;
use relay_game::domain::commands::{SetDeadlineDuration, SetResultsDestination, StartTurn};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::TurnResponse;
use crate::state::AppState;

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Request body for POST /start.
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    /// Who opens the chain.
    pub participant_id: u64,
}

/// Request body for PUT /deadline.
#[derive(Debug, Deserialize)]
pub struct DeadlineRequest {
    /// New per-turn deadline in seconds.
    pub seconds: i64,
}

/// Response body for PUT /deadline.
#[derive(Debug, Serialize)]
pub struct DeadlineResponse {
    /// The deadline now in force.
    pub deadline_duration_secs: i64,
}

/// Request and response body for PUT /results-destination.
#[derive(Debug, Deserialize, Serialize)]
pub struct ResultsDestinationBody {
    /// Where final reports go. `null` disables delivery.
    pub destination: Option<String>,
}

fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    command: &impl Command,
) -> Result<(), ApiError> {
    if !command.is_privileged() {
        return Ok(());
    }
    let Some(expected) = state.admin_token.as_deref() else {
        warn!(
            command_type = command.command_type(),
            "rejected admin request: no admin token configured"
        );
        return Err(ApiError::Unauthorized);
    };
    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented == Some(expected) {
        Ok(())
    } else {
        warn!(
            command_type = command.command_type(),
            "rejected admin request with missing or invalid token"
        );
        Err(ApiError::Unauthorized)
    }
}

/// POST /start
async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StartRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let command = StartTurn {
        correlation_id: Uuid::new_v4(),
        participant_id: ParticipantId(request.participant_id),
    };
    authorize(&state, &headers, &command)?;
    let assigned = state.relay.start(&command).await?;
    Ok(Json(assigned.into()))
}

/// PUT /deadline
async fn set_deadline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DeadlineRequest>,
) -> Result<Json<DeadlineResponse>, ApiError> {
    let command = SetDeadlineDuration {
        correlation_id: Uuid::new_v4(),
        seconds: request.seconds,
    };
    authorize(&state, &headers, &command)?;
    let duration = state.relay.set_deadline_duration(&command).await?;
    Ok(Json(DeadlineResponse {
        deadline_duration_secs: duration.num_seconds(),
    }))
}

/// PUT /results-destination
async fn set_results_destination(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResultsDestinationBody>,
) -> Result<Json<ResultsDestinationBody>, ApiError> {
    let destination = request.destination.filter(|d| !d.trim().is_empty());
    let command = SetResultsDestination {
        correlation_id: Uuid::new_v4(),
        destination: destination.clone(),
    };
    authorize(&state, &headers, &command)?;
    state.relay.set_results_destination(&command).await;
    Ok(Json(ResultsDestinationBody { destination }))
}

/// Returns the operator router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start))
        .route("/deadline", put(set_deadline))
        .route("/results-destination", put(set_results_destination))
}
