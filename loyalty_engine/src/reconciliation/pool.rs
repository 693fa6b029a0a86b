use std::sync::Arc;

use log::*;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    accrual::AccrualLookup,
    reconciliation::{
        coordinator::run_coordinator,
        reconciliation_queue,
        scheduler::run_scheduler,
        worker::Worker,
        PauseGate,
        PoolStats,
        QueueProducer,
        ReconciliationConfig,
        StatsSnapshot,
    },
    traits::LedgerDatabase,
};

/// A fixed-size pool of workers that resolves orders against the accrual service.
///
/// ```ignore
/// let client = AccrualClient::new("http://localhost:8081")?;
/// let pool = ReconciliationPool::new(ReconciliationConfig::default(), db, client);
/// let handle = pool.start();
/// // ...
/// handle.shutdown().await;
/// ```
pub struct ReconciliationPool<B, C> {
    config: ReconciliationConfig,
    ledger: B,
    client: Arc<C>,
}

impl<B, C> ReconciliationPool<B, C>
where
    B: LedgerDatabase + Send + Sync + 'static,
    C: AccrualLookup + Send + Sync + 'static,
{
    pub fn new(config: ReconciliationConfig, ledger: B, client: C) -> Self {
        Self { config, ledger, client: Arc::new(client) }
    }

    /// Spawns the workers, the coordinator and the poll scheduler onto the current tokio runtime and returns
    /// immediately.
    pub fn start(self) -> PoolHandle {
        let Self { config, ledger, client } = self;
        let (producer, consumer) = reconciliation_queue(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (report_tx, report_rx) = mpsc::channel(config.workers * 2);
        let gate = PauseGate::new();
        let stats = Arc::new(PoolStats::default());

        let workers = (0..config.workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    ledger: ledger.clone(),
                    client: Arc::clone(&client),
                    queue: consumer.clone(),
                    gate: gate.clone(),
                    cool_down: config.cool_down,
                    reports: report_tx.clone(),
                    stats: Arc::clone(&stats),
                    shutdown: shutdown_rx.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect::<Vec<_>>();
        // The coordinator stops once the last worker has dropped its sender
        drop(report_tx);
        let coordinator = tokio::spawn(run_coordinator(report_rx, config.cool_down, Arc::clone(&stats)));
        let scheduler = tokio::spawn(run_scheduler(ledger, producer.clone(), config.poll_interval, shutdown_rx));
        info!(
            "⚙️ Reconciliation pool started with {} workers, a queue of {} and a cool-down of {}s",
            config.workers,
            config.queue_capacity,
            config.cool_down.as_secs_f64()
        );
        PoolHandle { producer, gate, stats, shutdown: shutdown_tx, workers, scheduler, coordinator }
    }
}

/// Waits until shutdown is signalled on `shutdown`. If the sender is dropped without signalling, no shutdown can
/// ever come, and this never completes.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stopping| *stopping).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// A running reconciliation pool. Dropping the handle does not stop the pool. Call [`PoolHandle::shutdown`] for that.
#[derive(Debug)]
pub struct PoolHandle {
    producer: QueueProducer,
    gate: PauseGate,
    stats: Arc<PoolStats>,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
    scheduler: JoinHandle<()>,
    coordinator: JoinHandle<()>,
}

impl PoolHandle {
    /// A producer for the pool's queue, e.g. for the registration path to hand over new orders.
    pub fn producer(&self) -> QueueProducer {
        self.producer.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn pause_gate(&self) -> &PauseGate {
        &self.gate
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    /// Signals every task to stop and waits for them to finish. Lookups in flight are allowed to complete.
    pub async fn shutdown(self) {
        info!("⚙️ Shutting down the reconciliation pool");
        let _ = self.shutdown.send(true);
        if let Err(e) = self.scheduler.await {
            error!("⚙️ The poll scheduler did not shut down cleanly. {e}");
        }
        for (id, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!("⚙️ Worker {id} did not shut down cleanly. {e}");
            }
        }
        if let Err(e) = self.coordinator.await {
            error!("⚙️ The coordinator did not shut down cleanly. {e}");
        }
        info!("⚙️ Reconciliation pool has shut down. {:?}", self.stats.snapshot());
    }
}
