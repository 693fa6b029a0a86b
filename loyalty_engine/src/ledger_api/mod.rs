//! The public face of the ledger.
//!
//! [`LedgerApi`] is what a user-facing service calls to register orders, make withdrawals and read a user's ledger.
//! It validates input before it reaches the backend, and hands every newly registered order to the reconciliation
//! pipeline so that the accrual service is asked about it straight away rather than on the next poll.
mod api;

pub use api::LedgerApi;
