//! Game state, commands and candidate sampling.

pub mod commands;
pub mod sampling;
pub mod state;
