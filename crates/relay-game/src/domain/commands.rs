//! Commands for the relay game.

use relay_core::command::Command;
use relay_core::hop::Artifact;
use relay_core::participant::{Participant, ParticipantId};
use uuid::Uuid;

/// Command to join the game, or to re-queue after a completed turn.
#[derive(Debug, Clone)]
pub struct Register {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The joining player.
    pub participant: Participant,
}

impl Command for Register {
    fn command_type(&self) -> &'static str {
        "relay.register"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to leave the game.
#[derive(Debug, Clone)]
pub struct Leave {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The leaving player.
    pub participant_id: ParticipantId,
}

impl Command for Leave {
    fn command_type(&self) -> &'static str {
        "relay.leave"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Operator command to hand the artifact to the first holder.
#[derive(Debug, Clone)]
pub struct StartTurn {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player who opens the chain.
    pub participant_id: ParticipantId,
}

impl Command for StartTurn {
    fn command_type(&self) -> &'static str {
        "relay.start_turn"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn is_privileged(&self) -> bool {
        true
    }
}

/// Command by the current holder to submit their clip.
#[derive(Debug, Clone)]
pub struct SubmitArtifact {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The submitting holder.
    pub sender_id: ParticipantId,
    /// The submitted clip.
    pub artifact: Artifact,
}

impl Command for SubmitArtifact {
    fn command_type(&self) -> &'static str {
        "relay.submit_artifact"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command by a sender to pick the next holder from their offer.
#[derive(Debug, Clone)]
pub struct ChooseReceiver {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The sender of the pending hop.
    pub sender_id: ParticipantId,
    /// The chosen candidate.
    pub receiver_id: ParticipantId,
}

impl Command for ChooseReceiver {
    fn command_type(&self) -> &'static str {
        "relay.choose_receiver"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Operator command to change the per-turn deadline.
#[derive(Debug, Clone)]
pub struct SetDeadlineDuration {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// New deadline in seconds. Must be positive.
    pub seconds: i64,
}

impl Command for SetDeadlineDuration {
    fn command_type(&self) -> &'static str {
        "relay.set_deadline_duration"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn is_privileged(&self) -> bool {
        true
    }
}

/// Operator command to set (or clear) where final reports go.
#[derive(Debug, Clone)]
pub struct SetResultsDestination {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The destination, or `None` to stop delivering reports.
    pub destination: Option<String>,
}

impl Command for SetResultsDestination {
    fn command_type(&self) -> &'static str {
        "relay.set_results_destination"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn is_privileged(&self) -> bool {
        true
    }
}
