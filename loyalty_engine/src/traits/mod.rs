//! #  Ledger backend contracts
//!
//! This module defines the interface contracts that ledger database *backends* must implement.
//!
//! * [`LedgerDatabase`] is the write path: registering orders, applying accrual results to orders, withdrawing points
//!   and enumerating the orders that still need reconciliation. Every method is atomic.
//! * [`LedgerQueries`] is the read path used to serve users: their orders, withdrawals and balance. Each call reflects
//!   a consistent snapshot of the ledger.
//!
//! Both traits return futures that are `Send`, so that backends can be driven from spawned tokio tasks, such as the
//! reconciliation workers.
mod data_objects;
mod ledger_database;
mod ledger_queries;

pub use data_objects::StatusUpdate;
pub use ledger_database::{LedgerDatabase, LedgerError};
pub use ledger_queries::LedgerQueries;
