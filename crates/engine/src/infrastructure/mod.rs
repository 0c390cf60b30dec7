//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod persistence;
pub mod ports;
pub mod retry;
pub mod settings;
pub mod stage_client;
pub mod stage_runner;
