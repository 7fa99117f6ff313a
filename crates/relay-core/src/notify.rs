//! Outbound side channels: player notifications and result delivery.
//!
//! Both are best effort. Implementations report failures through
//! [`DeliveryError`]; the engine logs them and carries on.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::DeliveryError;
use crate::hop::Artifact;
use crate::participant::Participant;

/// Messages sent to a single participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The participant was picked by an operator to open the chain.
    FirstInChain,
    /// A sender chose the participant; carries the clip they received.
    YourTurn {
        /// Who passed the artifact on.
        from: Participant,
        /// The received artifact.
        artifact: Artifact,
    },
    /// The previous holder ran out of time and the participant was picked at
    /// random.
    AutoAssigned {
        /// The artifact, if the previous holder had submitted one.
        artifact: Option<Artifact>,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstInChain => {
                write!(f, "You're first in the chain! Submit your clip to pass it on.")
            }
            Self::YourTurn { from, artifact } => write!(
                f,
                "You're next in line! {} sent you {} ({} - {}).",
                from.display_name, artifact.reference, artifact.artist, artifact.title
            ),
            Self::AutoAssigned { artifact: Some(a) } => write!(
                f,
                "You were automatically chosen to continue the chain. Your clip: {}",
                a.reference
            ),
            Self::AutoAssigned { artifact: None } => {
                write!(f, "You were automatically chosen to continue the chain.")
            }
        }
    }
}

/// Delivers notifications to participants.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `notification` to `participant`.
    async fn notify(
        &self,
        participant: &Participant,
        notification: &Notification,
    ) -> Result<(), DeliveryError>;
}

/// One rendered line of a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    /// 1-based position in the chain.
    pub ordinal: usize,
    /// Sender label.
    pub sender: String,
    /// Receiver label.
    pub receiver: String,
    /// Artifact reference.
    pub artifact_ref: String,
    /// Artist.
    pub artist: String,
    /// Title.
    pub title: String,
}

/// A fixed-size page of report lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPage {
    /// 1-based page number.
    pub number: usize,
    /// Lines on this page.
    pub lines: Vec<ReportLine>,
}

/// The compiled end-of-game report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayReport {
    /// Paginated view for display.
    pub pages: Vec<ReportPage>,
    /// Flat textual rendering, one block per hop.
    pub text: String,
}

/// Delivers compiled reports to a results destination.
#[async_trait]
pub trait ResultsSink: Send + Sync {
    /// Delivers `report` to `destination`.
    async fn deliver(&self, destination: &str, report: &RelayReport) -> Result<(), DeliveryError>;
}
