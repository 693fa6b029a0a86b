//! SQLite backend for the loyalty ledger.
//!
//! [`SqliteDatabase`] implements the [`crate::traits::LedgerDatabase`] and [`crate::traits::LedgerQueries`] traits on
//! top of the low-level functions in [`db`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
