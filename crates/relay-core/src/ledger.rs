//! Ledger store abstraction.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::hop::CompletedHop;

/// Row identifier assigned by the store on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub i64);

/// Name under which an archived ledger was rotated away.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveId(pub String);

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable, ordered, append-only record of completed hops.
///
/// `append` must be durable before it returns `Ok`; the engine mutates its
/// in-memory chain only afterwards.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Appends a completed hop, returning its row id.
    async fn append(&self, hop: &CompletedHop) -> Result<EntryId, StoreError>;

    /// Loads every stored hop in insertion order.
    async fn load_all(&self) -> Result<Vec<CompletedHop>, StoreError>;

    /// Rotates the current store to a timestamped archive and starts a fresh,
    /// empty one with the same schema.
    async fn archive(&self) -> Result<ArchiveId, StoreError>;

    /// Discards every stored hop in place. Used when archival fails so the
    /// next game never starts on top of the previous one.
    async fn truncate(&self) -> Result<(), StoreError>;
}
