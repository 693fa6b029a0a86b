use std::time::Duration;

use log::*;
use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};

use crate::{
    reconciliation::{pool::shutdown_requested, QueueProducer},
    traits::LedgerDatabase,
};

/// Puts every unresolved order on the queue, once immediately and then every `period`, until shutdown.
pub(crate) async fn run_scheduler<B: LedgerDatabase + Sync>(
    ledger: B,
    queue: QueueProducer,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut timer = interval(period.max(Duration::from_millis(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("🕰️ Poll scheduler started. Unresolved orders are enqueued every {}s", period.as_secs_f64());
    loop {
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => break,
            _ = timer.tick() => {},
        }
        let stopping = *shutdown.borrow();
        if stopping || !poll_once(&ledger, &queue, &mut shutdown).await {
            break;
        }
    }
    info!("🕰️ Poll scheduler stopped");
}

/// Runs a single poll cycle. Returns `false` if the scheduler should stop.
async fn poll_once<B: LedgerDatabase>(ledger: &B, queue: &QueueProducer, shutdown: &mut watch::Receiver<bool>) -> bool {
    let numbers = match ledger.fetch_unresolved_orders().await {
        Ok(numbers) => numbers,
        Err(e) => {
            error!("🕰️ Could not fetch the unresolved orders. Skipping this cycle. {e}");
            return true;
        },
    };
    if numbers.is_empty() {
        trace!("🕰️ No unresolved orders");
        return true;
    }
    debug!("🕰️ Enqueuing {} unresolved orders", numbers.len());
    for number in numbers {
        tokio::select! {
            _ = shutdown_requested(shutdown) => return false,
            result = queue.enqueue(number) => {
                if let Err(e) = result {
                    warn!("🕰️ {e}. The poll scheduler cannot continue");
                    return false;
                }
            },
        }
    }
    true
}
