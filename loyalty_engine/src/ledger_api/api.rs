use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewWithdrawal, Order, OrderNumber, Points, UserBalance, UserId, Withdrawal},
    reconciliation::QueueProducer,
    traits::{LedgerDatabase, LedgerError, LedgerQueries},
};

pub struct LedgerApi<B> {
    db: B,
    queue: Option<QueueProducer>,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    /// A ledger API that does not hand new orders to a reconciliation pool. They will still be picked up by the
    /// pool's poll scheduler.
    pub fn new(db: B) -> Self {
        Self { db, queue: None }
    }

    /// A ledger API that enqueues every newly registered order on the given queue.
    pub fn with_queue(db: B, queue: QueueProducer) -> Self {
        Self { db, queue: Some(queue) }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> LedgerApi<B>
where B: LedgerDatabase + LedgerQueries
{
    /// Registers an order number for a user.
    ///
    /// The number must be all digits and pass the Luhn checksum. An order number can only ever belong to one user.
    /// Registering a number that already exists fails with [`LedgerError::AlreadyOwnedBySameUser`] or
    /// [`LedgerError::OwnedByAnotherUser`], and leaves the existing order untouched.
    ///
    /// If a queue is attached, the new order is enqueued for reconciliation. This waits for room in the queue.
    pub async fn register_order(&self, number: &str, user_id: &UserId) -> Result<Order, LedgerError> {
        let number = OrderNumber::parse(number)?;
        let order = self.db.insert_order(&number, user_id).await?;
        info!("📦️ Order {number} registered for user {user_id}");
        if let Some(queue) = &self.queue {
            match queue.enqueue(number.clone()).await {
                Ok(()) => trace!("📦️ Order {number} enqueued for reconciliation"),
                Err(e) => warn!("📦️ Could not enqueue order {number}. It will be picked up on the next poll. {e}"),
            }
        }
        Ok(order)
    }

    /// Spends `amount` points from the user's balance against a new order.
    ///
    /// Fails with [`LedgerError::InsufficientFunds`] if the balance does not cover the amount. Nothing is written in
    /// that case.
    pub async fn withdraw(&self, user_id: &UserId, order: &str, amount: Points) -> Result<Withdrawal, LedgerError> {
        let order_number = OrderNumber::parse(order)?;
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let withdrawal = NewWithdrawal::new(user_id.clone(), order_number, amount);
        let result = self.db.withdraw(withdrawal).await?;
        info!("💸️ User {user_id} withdrew {amount} against order {}", result.order_number);
        Ok(result)
    }

    pub async fn balance(&self, user_id: &UserId) -> Result<UserBalance, LedgerError> {
        self.db.fetch_balance(user_id).await
    }

    /// The user's withdrawals, oldest first.
    pub async fn withdrawals_for(&self, user_id: &UserId) -> Result<Vec<Withdrawal>, LedgerError> {
        self.db.fetch_withdrawals_for_user(user_id).await
    }

    /// The user's orders, oldest upload first.
    pub async fn orders_for(&self, user_id: &UserId) -> Result<Vec<Order>, LedgerError> {
        self.db.fetch_orders_for_user(user_id).await
    }

    pub async fn order(&self, number: &str) -> Result<Option<Order>, LedgerError> {
        let number = OrderNumber::parse(number)?;
        self.db.fetch_order(&number).await
    }
}
