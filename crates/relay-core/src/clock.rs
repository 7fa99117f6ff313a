//! Time source for turn deadlines, hop timestamps and archive names.

use chrono::{DateTime, Utc};

/// Abstraction over wall-clock time, injected so deadline expiry can be
/// driven by tests.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
