//! Player routes: joining, leaving, submitting and choosing.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use relay_core::hop::Artifact;
use relay_core::participant::{Participant, ParticipantId};
use relay_game::application::outcomes::{Departure, Handover, Registration, Submission};
use relay_game::application::status::{ChainView, RelayStatusView};
use relay_game::domain::commands::{ChooseReceiver, Leave, Register, SubmitArtifact};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::{FinalizationResponse, TurnResponse};
use crate::state::AppState;

/// Request body for POST /register.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Platform user id.
    pub participant_id: u64,
    /// Label used in reports.
    pub display_name: String,
}

/// Request body for POST /leave.
#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    /// Platform user id.
    pub participant_id: u64,
}

/// Request body for POST /submit.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// The holder submitting.
    pub participant_id: u64,
    /// Link to the clip.
    pub artifact_ref: String,
    /// Artist of the clip.
    pub artist: String,
    /// Title of the clip.
    pub title: String,
}

/// Request body for POST /choose.
#[derive(Debug, Deserialize)]
pub struct ChooseRequest {
    /// The holder choosing.
    pub participant_id: u64,
    /// The chosen candidate.
    pub receiver_id: u64,
}

/// Response body for POST /register.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// `joined` or `requeued`.
    pub status: &'static str,
}

/// Response body for a handover.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandoverResponse {
    /// The artifact moved on.
    Passed {
        /// The new holder.
        turn: TurnResponse,
    },
    /// Nobody was left; the game ended.
    Finished(FinalizationResponse),
}

impl From<Handover> for HandoverResponse {
    fn from(handover: Handover) -> Self {
        match handover {
            Handover::Passed { assigned, .. } => Self::Passed {
                turn: assigned.into(),
            },
            Handover::Finished(finalization) => Self::Finished(finalization.into()),
        }
    }
}

/// Response body for POST /leave.
#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    /// Set when the leaving participant held the artifact.
    pub handover: Option<HandoverResponse>,
}

/// Response body for POST /submit.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResponse {
    /// The sender must choose one of these.
    Offered {
        /// Offered receivers.
        candidates: Vec<Participant>,
    },
    /// Nobody was left to receive; the game ended.
    Finished(FinalizationResponse),
}

/// POST /register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let command = Register {
        correlation_id: Uuid::new_v4(),
        participant: Participant::new(request.participant_id, request.display_name),
    };
    let status = match state.relay.register(&command).await? {
        Registration::Joined => "joined",
        Registration::Requeued => "requeued",
    };
    Ok(Json(RegisterResponse { status }))
}

/// POST /leave
async fn leave(
    State(state): State<AppState>,
    Json(request): Json<LeaveRequest>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let command = Leave {
        correlation_id: Uuid::new_v4(),
        participant_id: ParticipantId(request.participant_id),
    };
    let handover = match state.relay.leave(&command).await? {
        Departure::Left => None,
        Departure::LeftHolding(handover) => Some(handover.into()),
    };
    Ok(Json(LeaveResponse { handover }))
}

/// POST /submit
async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let command = SubmitArtifact {
        correlation_id: Uuid::new_v4(),
        sender_id: ParticipantId(request.participant_id),
        artifact: Artifact::new(request.artifact_ref, request.artist, request.title),
    };
    let response = match state.relay.submit(&command).await? {
        Submission::Offered { candidates } => SubmitResponse::Offered { candidates },
        Submission::Finished(finalization) => SubmitResponse::Finished(finalization.into()),
    };
    Ok(Json(response))
}

/// POST /choose
async fn choose(
    State(state): State<AppState>,
    Json(request): Json<ChooseRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let command = ChooseReceiver {
        correlation_id: Uuid::new_v4(),
        sender_id: ParticipantId(request.participant_id),
        receiver_id: ParticipantId(request.receiver_id),
    };
    let assigned = state.relay.choose(&command).await?;
    Ok(Json(assigned.into()))
}

/// GET /status
async fn status(State(state): State<AppState>) -> Json<RelayStatusView> {
    Json(state.relay.status().await)
}

/// GET /chain
async fn chain(State(state): State<AppState>) -> Json<ChainView> {
    Json(state.relay.chain().await)
}

/// Returns the player router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/leave", post(leave))
        .route("/submit", post(submit))
        .route("/choose", post(choose))
        .route("/status", get(status))
        .route("/chain", get(chain))
}
