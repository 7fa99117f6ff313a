//! Test ledgers: mock `LedgerStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use relay_core::error::StoreError;
use relay_core::hop::CompletedHop;
use relay_core::ledger::{ArchiveId, EntryId, LedgerStore};

/// A ledger kept in memory. Records every append and every archival so tests
/// can assert on write-through and rotation.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    hops: Mutex<Vec<CompletedHop>>,
    archives: Mutex<Vec<(ArchiveId, Vec<CompletedHop>)>>,
    fail_archive: bool,
}

impl InMemoryLedgerStore {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with `hops`, as if left over from a
    /// previous process.
    #[must_use]
    pub fn with_hops(hops: Vec<CompletedHop>) -> Self {
        Self {
            hops: Mutex::new(hops),
            ..Self::default()
        }
    }

    /// Create a ledger that accepts appends but refuses to archive.
    #[must_use]
    pub fn failing_archive() -> Self {
        Self {
            fail_archive: true,
            ..Self::default()
        }
    }

    /// Returns a snapshot of the live (unarchived) hops.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn hops(&self) -> Vec<CompletedHop> {
        self.hops.lock().unwrap().clone()
    }

    /// Returns a snapshot of every archive taken so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn archives(&self) -> Vec<(ArchiveId, Vec<CompletedHop>)> {
        self.archives.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, hop: &CompletedHop) -> Result<EntryId, StoreError> {
        let mut hops = self.hops.lock().unwrap();
        hops.push(hop.clone());
        Ok(EntryId(i64::try_from(hops.len()).unwrap_or(i64::MAX)))
    }

    async fn load_all(&self) -> Result<Vec<CompletedHop>, StoreError> {
        Ok(self.hops.lock().unwrap().clone())
    }

    async fn archive(&self) -> Result<ArchiveId, StoreError> {
        if self.fail_archive {
            return Err(StoreError::Io("archive directory is read-only".into()));
        }
        let mut archives = self.archives.lock().unwrap();
        let id = ArchiveId(format!("archive_{}", archives.len() + 1));
        let hops = std::mem::take(&mut *self.hops.lock().unwrap());
        archives.push((id.clone(), hops));
        Ok(id)
    }

    async fn truncate(&self) -> Result<(), StoreError> {
        self.hops.lock().unwrap().clear();
        Ok(())
    }
}

/// A ledger that always returns a database error. Useful for testing that a
/// failed write-through leaves the game state untouched.
#[derive(Debug)]
pub struct FailingLedgerStore;

#[async_trait]
impl LedgerStore for FailingLedgerStore {
    async fn append(&self, _hop: &CompletedHop) -> Result<EntryId, StoreError> {
        Err(StoreError::Database("disk I/O error".into()))
    }

    async fn load_all(&self) -> Result<Vec<CompletedHop>, StoreError> {
        Err(StoreError::Database("disk I/O error".into()))
    }

    async fn archive(&self) -> Result<ArchiveId, StoreError> {
        Err(StoreError::Database("disk I/O error".into()))
    }

    async fn truncate(&self) -> Result<(), StoreError> {
        Err(StoreError::Database("disk I/O error".into()))
    }
}
