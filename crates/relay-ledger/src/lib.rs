//! Durable ledger of completed relay hops.
//!
//! The primary store is a single-file SQLite database; every append is
//! mirrored to a human-readable JSON audit log. Archival rotates both to
//! timestamped names.

pub mod audit;
pub mod schema;
pub mod sqlite_ledger_store;

pub use sqlite_ledger_store::{LedgerPaths, SqliteLedgerStore};
