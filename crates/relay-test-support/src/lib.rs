//! Shared test mocks and utilities for the clip relay game.

mod clock;
mod ledger;
mod notify;
mod rng;

pub use clock::{FixedClock, ManualClock};
pub use ledger::{FailingLedgerStore, InMemoryLedgerStore};
pub use notify::{FailingNotifier, RecordingNotifier, RecordingResultsSink};
pub use rng::{MockRng, SequenceRng};
