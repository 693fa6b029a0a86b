use std::{sync::Arc, time::Duration};

use log::*;
use tokio::sync::mpsc;

use crate::reconciliation::{PoolStats, WorkerReport};

/// Reads worker reports until every worker has hung up. Workers close the pause gate themselves when they are rate
/// limited. The coordinator logs and counts what they report.
pub(crate) async fn run_coordinator(
    mut reports: mpsc::Receiver<WorkerReport>,
    cool_down: Duration,
    stats: Arc<PoolStats>,
) {
    debug!("🚦️ Coordinator started");
    while let Some(report) = reports.recv().await {
        match report {
            WorkerReport::RateLimited { worker, order, opened_pause: true } => {
                stats.record_pause();
                warn!(
                    "🚦️ The accrual service is overloaded (worker {worker}, order {order}). All workers are paused for \
                     {}s",
                    cool_down.as_secs_f64()
                );
            },
            WorkerReport::RateLimited { worker, order, opened_pause: false } => {
                debug!("🚦️ Worker {worker} was rate limited on order {order} while the pool was already paused");
            },
            WorkerReport::LookupFailed { worker, order, error } => {
                warn!("🚦️ Worker {worker} could not look up order {order}. {error}");
            },
            WorkerReport::LedgerFailed { worker, order, error } => {
                error!("🚦️ Worker {worker} could not save the accrual result for order {order}. {error}");
            },
        }
    }
    debug!("🚦️ All workers have stopped. Coordinator is shutting down");
}
