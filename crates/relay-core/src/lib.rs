//! Relay Core: shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the ledger,
//! the game engine and the adapters depend on. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod hop;
pub mod ledger;
pub mod notify;
pub mod participant;
pub mod rng;
