//! Read-only views of the game for status commands.

use chrono::{DateTime, Utc};
use relay_core::participant::Participant;
use serde::Serialize;

use crate::domain::state::GameState;

/// Counts and current holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayStatusView {
    /// Registered participants.
    pub participant_count: usize,
    /// Registered participants who have not held the artifact yet.
    pub remaining_count: usize,
    /// Who holds the artifact.
    pub current_holder: Option<Participant>,
    /// When the current turn expires.
    pub deadline: Option<DateTime<Utc>>,
    /// Completed hops so far.
    pub chain_length: usize,
    /// Whether the holder has submitted and still has to choose.
    pub awaiting_choice: bool,
    /// Per-turn deadline in seconds.
    pub deadline_duration_secs: i64,
    /// Where final reports go.
    pub results_destination: Option<String>,
}

impl RelayStatusView {
    /// Builds the view from a state snapshot.
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        Self {
            participant_count: state.participants().count(),
            remaining_count: state.remaining().count(),
            current_holder: state.holder().cloned(),
            deadline: state.turn().map(|t| t.deadline),
            chain_length: state.chain().len(),
            awaiting_choice: state.pending().is_some(),
            deadline_duration_secs: state.deadline_duration().num_seconds(),
            results_destination: state.results_destination().map(str::to_owned),
        }
    }
}

/// One hop of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopView {
    /// 1-based position.
    pub ordinal: usize,
    /// Sender.
    pub sender: Participant,
    /// Receiver, unset while the sender is choosing.
    pub receiver: Option<Participant>,
    /// Artifact reference.
    pub artifact_ref: String,
    /// Artist.
    pub artist: String,
    /// Title.
    pub title: String,
}

/// The chain so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainView {
    /// Hops in order, a pending one last.
    pub hops: Vec<HopView>,
}

impl ChainView {
    /// Builds the view from a state snapshot.
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        let hops = state
            .entries()
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let artifact = entry.artifact();
                HopView {
                    ordinal: i + 1,
                    sender: entry.sender().clone(),
                    receiver: entry.receiver().cloned(),
                    artifact_ref: artifact.reference.clone(),
                    artist: artifact.artist.clone(),
                    title: artifact.title.clone(),
                }
            })
            .collect();
        Self { hops }
    }
}
