//! In-memory stand-ins for the ledger and the accrual service, for driving the pool under paused tokio time.
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use chrono::Utc;
use tokio::time::Instant;

use crate::{
    accrual::{AccrualClientError, AccrualLookup, LookupOutcome},
    db_types::{
        AccrualRecord,
        AccrualStatus,
        NewWithdrawal,
        Order,
        OrderNumber,
        OrderStatusType,
        Points,
        UserId,
        Withdrawal,
    },
    traits::{LedgerDatabase, LedgerError, StatusUpdate},
};

/// Builds a Luhn-valid order number from `seed` by appending the check digit.
pub fn order_number(seed: u64) -> OrderNumber {
    let payload = seed.to_string();
    let sum: u32 = payload
        .chars()
        .rev()
        .enumerate()
        .map(|(i, c)| {
            let d = c.to_digit(10).unwrap();
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    OrderNumber::parse(format!("{payload}{check}")).unwrap()
}

#[derive(Default)]
struct LedgerState {
    orders: Mutex<Vec<Order>>,
    failed_enumerations_left: AtomicUsize,
    fail_updates: AtomicBool,
}

#[derive(Clone, Default)]
pub struct FakeLedger {
    state: Arc<LedgerState>,
}

impl FakeLedger {
    /// A ledger holding `count` `NEW` orders for user "alice".
    pub fn with_orders(count: u64) -> Self {
        let ledger = Self::default();
        {
            let mut orders = ledger.state.orders.lock().unwrap();
            for i in 0..count {
                orders.push(new_order(order_number(1_234_000 + i), UserId::from("alice")));
            }
        }
        ledger
    }

    pub fn numbers(&self) -> Vec<OrderNumber> {
        self.state.orders.lock().unwrap().iter().map(|o| o.number.clone()).collect()
    }

    pub fn order(&self, number: &OrderNumber) -> Order {
        self.state.orders.lock().unwrap().iter().find(|o| &o.number == number).cloned().unwrap()
    }

    pub fn fail_next_enumerations(&self, count: usize) {
        self.state.failed_enumerations_left.store(count, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.state.fail_updates.store(fail, Ordering::SeqCst);
    }
}

fn new_order(number: OrderNumber, user_id: UserId) -> Order {
    let now = Utc::now();
    Order { number, user_id, status: OrderStatusType::New, accrual: None, uploaded_at: now, updated_at: now }
}

impl LedgerDatabase for FakeLedger {
    fn url(&self) -> &str {
        "memory://"
    }

    async fn insert_order(&self, number: &OrderNumber, user_id: &UserId) -> Result<Order, LedgerError> {
        let mut orders = self.state.orders.lock().unwrap();
        match orders.iter().find(|o| &o.number == number) {
            Some(o) if &o.user_id == user_id => Err(LedgerError::AlreadyOwnedBySameUser(number.clone())),
            Some(_) => Err(LedgerError::OwnedByAnotherUser(number.clone())),
            None => {
                let order = new_order(number.clone(), user_id.clone());
                orders.push(order.clone());
                Ok(order)
            },
        }
    }

    async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Option<Points>,
    ) -> Result<StatusUpdate, LedgerError> {
        if self.state.fail_updates.load(Ordering::SeqCst) {
            return Err(LedgerError::DatabaseError("the disk is full".to_string()));
        }
        let mut orders = self.state.orders.lock().unwrap();
        let order = orders
            .iter_mut()
            .find(|o| &o.number == number)
            .ok_or_else(|| LedgerError::OrderNotFound(number.clone()))?;
        if order.status.is_terminal() {
            return Ok(StatusUpdate::AlreadyTerminal(order.clone()));
        }
        order.status = status;
        order.accrual = accrual;
        order.updated_at = Utc::now();
        Ok(StatusUpdate::Updated(order.clone()))
    }

    async fn fetch_unresolved_orders(&self) -> Result<Vec<OrderNumber>, LedgerError> {
        let left = self.state.failed_enumerations_left.load(Ordering::SeqCst);
        if left > 0 {
            self.state.failed_enumerations_left.store(left - 1, Ordering::SeqCst);
            return Err(LedgerError::DatabaseError("database is locked".to_string()));
        }
        let orders = self.state.orders.lock().unwrap();
        Ok(orders.iter().filter(|o| !o.status.is_terminal()).map(|o| o.number.clone()).collect())
    }

    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        Err(LedgerError::InsufficientFunds { requested: withdrawal.amount, available: Points::default() })
    }
}

/// How the fake accrual service answers a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Processed(i64),
    Registered,
    Processing,
    Invalid,
    NotFound,
    RateLimited,
    Fail,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub order: OrderNumber,
    pub started: Instant,
    pub finished: Instant,
    pub reply: Reply,
}

struct AccrualState {
    default: Reply,
    scripts: Mutex<HashMap<OrderNumber, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
    latency: Duration,
}

/// A fake accrual service. Each order answers from its script until the script runs out, and with the default reply
/// after that. Every lookup takes 10ms, except rate-limit replies, which come back after 5ms. A rate limit therefore
/// never lands on the same instant as another worker's next dequeue.
#[derive(Clone)]
pub struct ScriptedAccrual {
    state: Arc<AccrualState>,
}

impl ScriptedAccrual {
    pub fn new(default: Reply) -> Self {
        let state = AccrualState {
            default,
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::from_millis(10),
        };
        Self { state: Arc::new(state) }
    }

    pub fn script(self, number: &OrderNumber, replies: &[Reply]) -> Self {
        self.state.scripts.lock().unwrap().insert(number.clone(), replies.iter().copied().collect());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, number: &OrderNumber) -> usize {
        self.state.calls.lock().unwrap().iter().filter(|c| &c.order == number).count()
    }

    fn next_reply(&self, number: &OrderNumber) -> Reply {
        let mut scripts = self.state.scripts.lock().unwrap();
        scripts.get_mut(number).and_then(|script| script.pop_front()).unwrap_or(self.state.default)
    }
}

impl AccrualLookup for ScriptedAccrual {
    async fn lookup(&self, number: &OrderNumber) -> LookupOutcome {
        let started = Instant::now();
        let reply = self.next_reply(number);
        let latency = match reply {
            Reply::RateLimited => self.state.latency / 2,
            _ => self.state.latency,
        };
        tokio::time::sleep(latency).await;
        let call = Call { order: number.clone(), started, finished: Instant::now(), reply };
        self.state.calls.lock().unwrap().push(call);
        let record = |status, accrual| LookupOutcome::Resolved(AccrualRecord::new(number, status, accrual));
        match reply {
            Reply::Processed(points) => record(AccrualStatus::Processed, Some(Points::from_points(points))),
            Reply::Registered => record(AccrualStatus::Registered, None),
            Reply::Processing => record(AccrualStatus::Processing, None),
            Reply::Invalid => record(AccrualStatus::Invalid, None),
            Reply::NotFound => LookupOutcome::NotFound,
            Reply::RateLimited => LookupOutcome::RateLimited,
            Reply::Fail => LookupOutcome::TransportError(AccrualClientError::UnexpectedStatus {
                status: 500,
                body: "internal error".to_string(),
            }),
        }
    }
}
