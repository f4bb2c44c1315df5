#![forbid(unsafe_code)]

//! Supervisor for the motor simulation.
//!
//! Provisions the FIFOs the workers talk over, launches the workers in
//! dependency order, waits for the first one to exit and tears the
//! session down in a fixed order.

pub mod channel;
pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod session_log;

pub use config::SupervisorConfig;
pub use errors::{AppError, Result, SpawnError};
