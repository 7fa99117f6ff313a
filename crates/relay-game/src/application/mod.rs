//! Turn engine, watchdog, result compiler and status queries.

pub mod outcomes;
pub mod results;
pub mod service;
pub mod status;
pub mod watchdog;
