//! Clip relay game.
//!
//! A clip is passed player to player along a chain. Each holder submits the
//! clip and picks the next holder from a small random offer, or the deadline
//! watchdog picks one for them. When nobody is left to receive it the chain
//! is compiled into a report and the ledger is archived.

pub mod application;
pub mod domain;
