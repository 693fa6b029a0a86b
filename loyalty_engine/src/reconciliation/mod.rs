//! # Accrual reconciliation pipeline
//!
//! Orders are registered in the `NEW` status, and it is up to the accrual service to decide what they are worth. This
//! module keeps asking the service until every order has reached a terminal status.
//!
//! The pipeline is made up of
//! * a bounded [queue](reconciliation_queue) of order numbers awaiting a lookup,
//! * a poll scheduler that periodically puts every unresolved order back on the queue,
//! * a fixed number of workers that take order numbers off the queue, look them up with an [`AccrualLookup`] and write
//!   the results to the ledger,
//! * a coordinator that listens to reports from the workers. When a worker is told that the accrual service is
//!   overloaded, the coordinator closes the shared [`PauseGate`] and no worker starts another lookup until the
//!   cool-down period has passed.
//!
//! [`ReconciliationPool::start`] spins everything up on the tokio runtime and returns a [`PoolHandle`].
//!
//! [`AccrualLookup`]: crate::accrual::AccrualLookup
mod config;
mod coordinator;
mod pause_gate;
mod pool;
mod queue;
mod scheduler;
mod stats;
mod worker;

#[cfg(test)]
mod fakes;

pub use config::{ReconciliationConfig, DEFAULT_COOL_DOWN, DEFAULT_POLL_INTERVAL, DEFAULT_WORKERS};
pub use pause_gate::PauseGate;
pub use pool::{PoolHandle, ReconciliationPool};
pub use queue::{reconciliation_queue, QueueConsumer, QueueError, QueueProducer};
pub use stats::{PoolStats, StatsSnapshot};
pub use worker::WorkerReport;
