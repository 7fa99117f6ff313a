//! Results returned by the turn engine to its callers.

use chrono::{DateTime, Utc};
use relay_core::hop::CompletedHop;
use relay_core::ledger::ArchiveId;
use relay_core::notify::RelayReport;
use relay_core::participant::Participant;

pub use crate::domain::state::Registration;

/// A participant now holds the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnAssigned {
    /// The new holder.
    pub holder: Participant,
    /// When their turn expires.
    pub deadline: DateTime<Utc>,
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The sender must now choose one of these receivers.
    Offered {
        /// The offered receivers.
        candidates: Vec<Participant>,
    },
    /// Nobody was left to receive the artifact; the game was finalized.
    Finished(Finalization),
}

/// What happened to the turn when its holder timed out or left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handover {
    /// The artifact moved to a randomly picked participant.
    Passed {
        /// The new holder and deadline.
        assigned: TurnAssigned,
        /// The pending hop that was back-filled, if the old holder had
        /// submitted.
        hop: Option<CompletedHop>,
    },
    /// Nobody was left; the game was finalized.
    Finished(Finalization),
}

/// Result of a `leave`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The participant left without holding the artifact.
    Left,
    /// The participant held the artifact; the turn was handed over.
    LeftHolding(Handover),
}

/// Result of finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalization {
    /// The compiled report, `None` when the chain was empty.
    pub report: Option<RelayReport>,
    /// Whether the report reached its destination.
    pub delivered: bool,
    /// Where the ledger was archived, if archival succeeded.
    pub archive: Option<ArchiveId>,
}

/// Result of restart recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    /// Number of hops reloaded from the ledger.
    pub hops: usize,
    /// Set when the reloaded chain had already ended and was finalized.
    pub finalization: Option<Finalization>,
}
