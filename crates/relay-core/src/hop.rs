//! Relay hops: one sender-to-receiver transfer of the artifact.
//!
//! A hop is either still waiting for its receiver ([`PendingHop`]) or
//! finalized ([`CompletedHop`]). Only completed hops reach durable storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::participant::{Participant, ParticipantId};

/// The clip being relayed, as submitted by a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Link or other reference to the clip.
    pub reference: String,
    /// Artist credited for the clip.
    pub artist: String,
    /// Title of the clip.
    pub title: String,
}

impl Artifact {
    /// Creates an artifact.
    #[must_use]
    pub fn new(
        reference: impl Into<String>,
        artist: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            artist: artist.into(),
            title: title.into(),
        }
    }
}

/// A hop whose sender has submitted but whose receiver is not chosen yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHop {
    /// The holder who submitted the artifact.
    pub sender: Participant,
    /// The submitted artifact.
    pub artifact: Artifact,
    /// Receivers most recently offered to the sender.
    pub candidates: Vec<Participant>,
    /// When the sender submitted.
    pub submitted_at: DateTime<Utc>,
}

impl PendingHop {
    /// Returns the offered candidate with the given id, if any.
    #[must_use]
    pub fn offered(&self, id: ParticipantId) -> Option<&Participant> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Closes the hop with `receiver`. Completed hops are immutable.
    #[must_use]
    pub fn complete(self, receiver: Participant, recorded_at: DateTime<Utc>) -> CompletedHop {
        CompletedHop {
            sender: self.sender,
            receiver,
            artifact: self.artifact,
            recorded_at,
        }
    }
}

/// A finalized hop, as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedHop {
    /// The holder who passed the artifact on.
    pub sender: Participant,
    /// The participant who received it.
    pub receiver: Participant,
    /// The relayed artifact.
    pub artifact: Artifact,
    /// When the hop was finalized.
    pub recorded_at: DateTime<Utc>,
}

impl CompletedHop {
    /// A hop passed back to its own sender marks the end of the chain.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.sender.id == self.receiver.id
    }
}

/// One element of the relay chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEntry {
    /// Submitted, receiver not yet chosen.
    Pending(PendingHop),
    /// Finalized.
    Completed(CompletedHop),
}

impl ChainEntry {
    /// The sender of this hop.
    #[must_use]
    pub fn sender(&self) -> &Participant {
        match self {
            Self::Pending(hop) => &hop.sender,
            Self::Completed(hop) => &hop.sender,
        }
    }

    /// The relayed artifact.
    #[must_use]
    pub fn artifact(&self) -> &Artifact {
        match self {
            Self::Pending(hop) => &hop.artifact,
            Self::Completed(hop) => &hop.artifact,
        }
    }

    /// The receiver, once the hop is completed.
    #[must_use]
    pub fn receiver(&self) -> Option<&Participant> {
        match self {
            Self::Pending(_) => None,
            Self::Completed(hop) => Some(&hop.receiver),
        }
    }
}
