use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_COOL_DOWN: Duration = Duration::from_secs(120);
/// The queue holds this many order numbers per worker unless configured otherwise.
pub const QUEUE_SLOTS_PER_WORKER: usize = 10;

/// Tuning knobs for the reconciliation pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationConfig {
    /// The number of concurrent workers. Always at least one.
    pub workers: usize,
    /// How often every unresolved order is put back on the queue.
    pub poll_interval: Duration,
    /// How long the whole pool stops making lookups after the accrual service reports that it is overloaded.
    pub cool_down: Duration,
    /// The maximum number of order numbers waiting in the queue.
    pub queue_capacity: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl ReconciliationConfig {
    /// A configuration with `workers` workers and a queue sized to match. The other fields take their defaults.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cool_down: DEFAULT_COOL_DOWN,
            queue_capacity: workers * QUEUE_SLOTS_PER_WORKER,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the poll interval. A zero interval is raised to one millisecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_cool_down(mut self, cool_down: Duration) -> Self {
        self.cool_down = cool_down;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}
