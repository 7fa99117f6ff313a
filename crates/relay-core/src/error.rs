//! Domain error types.

use thiserror::Error;

use crate::participant::ParticipantId;

/// Errors returned by relay commands.
///
/// Every variant is recoverable: a command that fails leaves the game state
/// exactly as it found it.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The participant is not registered.
    #[error("participant {0} is not registered")]
    NotRegistered(ParticipantId),

    /// The participant is registered and still waiting for a turn.
    #[error("participant {0} is already registered and waiting for a turn")]
    AlreadyWaiting(ParticipantId),

    /// The participant already held the artifact in this game.
    #[error("participant {0} has already taken a turn")]
    AlreadyTaken(ParticipantId),

    /// The participant does not currently hold the artifact.
    #[error("it is not participant {0}'s turn")]
    NotYourTurn(ParticipantId),

    /// No pending hop of this sender offered the requested receiver.
    #[error("participant {0} may not choose that receiver")]
    NotAuthorized(ParticipantId),

    /// Turn deadlines must be strictly positive.
    #[error("invalid turn duration: {0} seconds")]
    InvalidDuration(i64),

    /// The durable ledger could not be written or read.
    #[error("ledger store error: {0}")]
    Store(#[from] StoreError),
}

/// Durable ledger failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database driver or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Filesystem error while opening, renaming or writing store files.
    #[error("i/o error: {0}")]
    Io(String),

    /// Row or mirror (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Best-effort delivery failures (notifications and result reports).
///
/// These are logged by the engine and never fail a state transition.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient could not be reached.
    #[error("recipient unreachable: {0}")]
    Unreachable(String),

    /// Delivery did not complete within the configured timeout.
    #[error("delivery timed out")]
    TimedOut,

    /// Writing the delivered payload failed.
    #[error("delivery i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DeliveryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
