use std::fmt::Debug;

use cucumber::World;
use log::*;
use loyalty_engine::{
    accrual::AccrualClient,
    db_types::Withdrawal,
    reconciliation::{PoolHandle, ReconciliationConfig, ReconciliationPool},
    LedgerApi,
    LedgerError,
    SqliteDatabase,
};
use wiremock::MockServer;

use crate::support::prepare_env::prepare_test_env;

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
}

pub struct LoyaltySystem {
    pub db: SqliteDatabase,
    pub api: LedgerApi<SqliteDatabase>,
    pub accrual: Option<MockServer>,
    pub pool: Option<PoolHandle>,
    pub last_withdrawal: Option<Result<Withdrawal, LedgerError>>,
}

impl Debug for LoyaltySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoyaltySystem ({:?})", self.db)
    }
}

impl LoyaltyWorld {
    pub fn system(&mut self) -> &mut LoyaltySystem {
        self.system.as_mut().expect("The ledger has not been initialised")
    }

    pub fn api(&self) -> &LedgerApi<SqliteDatabase> {
        &self.system.as_ref().expect("The ledger has not been initialised").api
    }
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let db = prepare_test_env().await;
        let api = LedgerApi::new(db.clone());
        Self { db, api, accrual: None, pool: None, last_withdrawal: None }
    }

    pub fn accrual(&self) -> &MockServer {
        self.accrual.as_ref().expect("The accrual service has not been started")
    }

    pub fn start_pool(&mut self) {
        let client = AccrualClient::new(&self.accrual().uri()).expect("Could not create the accrual client");
        let config = ReconciliationConfig::new(2)
            .with_poll_interval(std::time::Duration::from_millis(200))
            .with_cool_down(std::time::Duration::from_secs(60));
        let handle = ReconciliationPool::new(config, self.db.clone(), client).start();
        self.api = LedgerApi::with_queue(self.db.clone(), handle.producer());
        self.pool = Some(handle);
        debug!("🚀️ Reconciliation pool started against {}", self.accrual().uri());
    }
}
