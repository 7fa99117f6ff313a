//! JSON audit mirror of the ledger.
//!
//! Not authoritative: it exists for out-of-band inspection, so callers log
//! its failures instead of propagating them.

use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use relay_core::error::StoreError;
use relay_core::hop::CompletedHop;
use serde::{Deserialize, Serialize};

/// One mirrored hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Sender platform id.
    pub sender_id: u64,
    /// Receiver platform id.
    pub receiver_id: u64,
    /// Artifact reference.
    pub artifact_ref: String,
    /// Artist.
    pub artist: String,
    /// Title.
    pub title: String,
    /// When the hop was recorded, ISO-8601 UTC.
    pub timestamp: DateTime<Utc>,
}

impl From<&CompletedHop> for AuditRecord {
    fn from(hop: &CompletedHop) -> Self {
        Self {
            sender_id: hop.sender.id.0,
            receiver_id: hop.receiver.id.0,
            artifact_ref: hop.artifact.reference.clone(),
            artist: hop.artifact.artist.clone(),
            title: hop.artifact.title.clone(),
            timestamp: hop.recorded_at,
        }
    }
}

/// Reads the mirror at `path`. A missing file is an empty mirror.
///
/// # Errors
///
/// Returns `StoreError::Io` if the file cannot be read and
/// `StoreError::Serialization` if it is not a JSON array of records.
pub async fn read_records(path: &Path) -> Result<Vec<AuditRecord>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Appends `hop` to the mirror at `path`, rewriting the whole array.
///
/// # Errors
///
/// Returns `StoreError` if the existing mirror cannot be read or the new one
/// cannot be written.
pub async fn append_record(path: &Path, hop: &CompletedHop) -> Result<(), StoreError> {
    let mut records = read_records(path).await?;
    records.push(AuditRecord::from(hop));
    let body = serde_json::to_vec_pretty(&records)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

/// Replaces the mirror at `path` with an empty array.
///
/// # Errors
///
/// Returns `StoreError::Io` if the file cannot be written.
pub async fn clear(path: &Path) -> Result<(), StoreError> {
    tokio::fs::write(path, b"[]").await?;
    Ok(())
}
