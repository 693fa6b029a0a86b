//! # Loyalty daemon
//! This crate hosts the long-running process that keeps the loyalty ledger in step with the accrual service. It:
//! * opens (and if needed creates and migrates) the ledger database,
//! * starts the reconciliation pool, which polls every unresolved order against the accrual service,
//! * waits for Ctrl-C and then shuts the pool down, letting lookups in flight finish.
//!
//! ## Configuration
//! The daemon is configured via environment variables. See [config](config/index.html) for more information.

pub mod cli;
pub mod config;
pub mod daemon;
pub mod errors;
