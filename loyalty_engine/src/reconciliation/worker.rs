use std::{sync::Arc, time::Duration};

use log::*;
use tokio::sync::{mpsc, watch};

use crate::{
    accrual::{AccrualClientError, AccrualLookup, LookupOutcome},
    db_types::{AccrualRecord, OrderNumber},
    reconciliation::{pool::shutdown_requested, PauseGate, PoolStats, QueueConsumer},
    traits::{LedgerDatabase, LedgerError, StatusUpdate},
};

/// Something a worker wants the coordinator to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerReport {
    /// The accrual service refused the lookup because it is overloaded. The worker has already closed the pause
    /// gate. `opened_pause` is set if the gate was open until then.
    RateLimited { worker: usize, order: OrderNumber, opened_pause: bool },
    /// The lookup failed. The order stays unresolved and will be looked up again on the next poll.
    LookupFailed { worker: usize, order: OrderNumber, error: AccrualClientError },
    /// The accrual service answered, but the answer could not be written to the ledger.
    LedgerFailed { worker: usize, order: OrderNumber, error: LedgerError },
}

pub(crate) struct Worker<B, C> {
    pub id: usize,
    pub ledger: B,
    pub client: Arc<C>,
    pub queue: QueueConsumer,
    pub gate: PauseGate,
    pub cool_down: Duration,
    pub reports: mpsc::Sender<WorkerReport>,
    pub stats: Arc<PoolStats>,
    pub shutdown: watch::Receiver<bool>,
}

impl<B, C> Worker<B, C>
where
    B: LedgerDatabase + Send + Sync,
    C: AccrualLookup + Send + Sync,
{
    /// Runs until shutdown is signalled or the queue closes. A failed lookup or ledger write never stops the worker.
    pub async fn run(mut self) {
        debug!("⚙️ Worker {} started", self.id);
        loop {
            if !self.wait_for_gate().await {
                break;
            }
            let number = tokio::select! {
                _ = shutdown_requested(&mut self.shutdown) => break,
                next = self.queue.dequeue() => match next {
                    Some(number) => number,
                    None => {
                        debug!("⚙️ Worker {} found the queue closed", self.id);
                        break;
                    },
                },
            };
            // The pool may have been paused while this worker was waiting on the queue
            if !self.wait_for_gate().await {
                break;
            }
            self.process(number).await;
        }
        debug!("⚙️ Worker {} stopped", self.id);
    }

    /// Sleeps while the pause gate is closed. Returns `false` if shutdown was signalled in the meantime.
    async fn wait_for_gate(&mut self) -> bool {
        loop {
            if *self.shutdown.borrow() {
                return false;
            }
            let Some(deadline) = self.gate.paused_until() else {
                return true;
            };
            trace!("⚙️ Worker {} is paused", self.id);
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {},
                _ = shutdown_requested(&mut self.shutdown) => return false,
            }
        }
    }

    async fn process(&self, number: OrderNumber) {
        self.stats.record_lookup();
        trace!("⚙️ Worker {} is looking up order {number}", self.id);
        match self.client.lookup(&number).await {
            LookupOutcome::Resolved(record) => {
                self.stats.record_resolved();
                self.apply(number, record).await;
            },
            LookupOutcome::NotFound => {
                self.stats.record_not_found();
                trace!("⚙️ Order {number} is not known to the accrual service yet. It will be retried later");
            },
            LookupOutcome::RateLimited => {
                self.stats.record_rate_limited();
                // Close the gate before anything else, so that this worker does not start another lookup
                let opened_pause = self.gate.close_for(self.cool_down);
                self.report(WorkerReport::RateLimited { worker: self.id, order: number, opened_pause }).await;
            },
            LookupOutcome::TransportError(error) => {
                self.stats.record_transport_error();
                self.report(WorkerReport::LookupFailed { worker: self.id, order: number, error }).await;
            },
        }
    }

    async fn apply(&self, number: OrderNumber, record: AccrualRecord) {
        let status = record.order_status();
        let accrual = record.ledger_accrual();
        match self.ledger.update_order_status(&number, status, accrual).await {
            Ok(StatusUpdate::Updated(order)) => {
                trace!("⚙️ Worker {} set order {number} to {}", self.id, order.status);
            },
            Ok(StatusUpdate::AlreadyTerminal(order)) => {
                debug!("⚙️ Order {number} was already {}. The accrual result was discarded", order.status);
            },
            Err(error) => {
                self.stats.record_ledger_error();
                self.report(WorkerReport::LedgerFailed { worker: self.id, order: number, error }).await;
            },
        }
    }

    async fn report(&self, report: WorkerReport) {
        if self.reports.send(report).await.is_err() {
            warn!("⚙️ Worker {} could not send a report. The coordinator has stopped", self.id);
        }
    }
}
