//! `SqliteDatabase` is a concrete implementation of a loyalty ledger backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::db::{balances, new_pool, orders, withdrawals};
use crate::{
    db_types::{NewWithdrawal, Order, OrderNumber, OrderStatusType, Points, UserBalance, UserId, Withdrawal},
    traits::{LedgerDatabase, LedgerError, LedgerQueries, StatusUpdate},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, number: &OrderNumber, user_id: &UserId) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(number, user_id, &mut conn).await?;
        debug!("🗃️ Order {number} has been registered for user {user_id}");
        Ok(order)
    }

    async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Option<Points>,
    ) -> Result<StatusUpdate, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let update = orders::update_order_status(number, status, accrual, &mut tx).await?;
        tx.commit().await?;
        if update.is_updated() {
            match accrual {
                Some(points) => debug!("🗃️ Order {number} is now {status} with an accrual of {points}"),
                None => debug!("🗃️ Order {number} is now {status}"),
            }
        }
        Ok(update)
    }

    async fn fetch_unresolved_orders(&self) -> Result<Vec<OrderNumber>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let numbers = orders::fetch_unresolved_orders(&mut conn).await?;
        trace!("🗃️ {} orders are awaiting resolution", numbers.len());
        Ok(numbers)
    }

    /// Withdraws points in a single transaction.
    ///
    /// The first statement in the transaction is the conditional insert, which is a write. SQLite therefore takes the
    /// write lock before the balance is read, and concurrent withdrawals for the same user are serialised.
    async fn withdraw(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        if !withdrawal.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(withdrawal.amount));
        }
        let mut tx = self.pool.begin().await?;
        match withdrawals::insert_withdrawal_if_funded(&withdrawal, &mut tx).await? {
            Some(w) => {
                tx.commit().await?;
                debug!(
                    "🗃️ {} withdrawn by {} against order {}",
                    w.amount, withdrawal.user_id, withdrawal.order_number
                );
                Ok(w)
            },
            None => {
                let balance = balances::fetch_balance(&withdrawal.user_id, &mut tx).await?;
                tx.rollback().await?;
                info!(
                    "🗃️ Withdrawal of {} by {} refused. Only {} is available",
                    withdrawal.amount, withdrawal.user_id, balance.current
                );
                Err(LedgerError::InsufficientFunds { requested: withdrawal.amount, available: balance.current })
            },
        }
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl LedgerQueries for SqliteDatabase {
    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: &UserId) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let withdrawals = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(withdrawals)
    }

    async fn fetch_balance(&self, user_id: &UserId) -> Result<UserBalance, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let balance = balances::fetch_balance(user_id, &mut conn).await?;
        Ok(balance)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Creates the database file if it does not exist yet, and then connects to it.
    pub async fn create_if_missing(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        if !Sqlite::database_exists(url).await? {
            info!("🗃️ Database {url} does not exist. Creating it now.");
            Sqlite::create_database(url).await?;
        }
        SqliteDatabase::new_with_url(url, max_connections).await
    }

    /// Brings the schema up to date by running any outstanding migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
