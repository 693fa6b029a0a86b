//! Loyalty Engine
//!
//! The loyalty engine keeps a ledger of loyalty points for users. Users register the numbers of orders they placed,
//! and an external accrual service decides, in its own time, whether each order earns points and how many. Users can
//! spend their accrued points by making withdrawals against new orders.
//!
//! The library is divided into three main sections:
//! 1. The ledger backend ([`mod@traits`] and [`mod@sqlite`]). The traits define what a backend must provide. SQLite is
//!    the supported backend. The data types used by the ledger are defined in the [`mod@db_types`] module and are
//!    public.
//! 2. The ledger public API ([`LedgerApi`]). This is what the registration, withdrawal and read paths of a user-facing
//!    service call into. It validates order numbers and hands newly registered orders to the reconciliation pipeline.
//! 3. The reconciliation pipeline ([`mod@accrual`] and [`mod@reconciliation`]). A pool of workers pulls order numbers
//!    from a bounded queue, asks the accrual service about each one and writes the result back to the ledger. When
//!    the accrual service says it is overloaded, the whole pool pauses for a cool-down period.
pub mod accrual;
pub mod db_types;
pub mod helpers;
mod ledger_api;
pub mod reconciliation;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use ledger_api::LedgerApi;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{LedgerDatabase, LedgerError, LedgerQueries, StatusUpdate};
