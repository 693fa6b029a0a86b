use std::future::Future;

use thiserror::Error;

use crate::{
    db_types::{NewWithdrawal, Order, OrderNumber, OrderNumberError, OrderStatusType, Points, UserId, Withdrawal},
    traits::StatusUpdate,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Order {0} has already been registered by another user")]
    OwnedByAnotherUser(OrderNumber),
    #[error("Order {0} has already been registered by this user")]
    AlreadyOwnedBySameUser(OrderNumber),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { requested: Points, available: Points },
    #[error("Withdrawal amounts must be positive. Requested {0}")]
    InvalidAmount(Points),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// This trait defines the write path of a ledger backend.
///
/// This behaviour includes:
/// * Registering orders for users, enforcing single ownership of an order number.
/// * Applying accrual results to orders, while keeping terminal statuses fixed.
/// * Withdrawing points, without ever letting a user's balance go negative.
/// * Enumerating the orders that still need to be reconciled with the accrual service.
pub trait LedgerDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Registers a new order in the `NEW` status for the given user.
    ///
    /// This is atomic with respect to concurrent registrations of the same order number. If the number already
    /// exists, nothing is changed and either [`LedgerError::AlreadyOwnedBySameUser`] or
    /// [`LedgerError::OwnedByAnotherUser`] is returned.
    fn insert_order(
        &self,
        number: &OrderNumber,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Order, LedgerError>> + Send;

    /// Sets the status and accrual of an order in a single transaction.
    ///
    /// If the order is already `INVALID` or `PROCESSED`, nothing is changed and [`StatusUpdate::AlreadyTerminal`]
    /// is returned. If the order does not exist, [`LedgerError::OrderNotFound`] is returned.
    fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Option<Points>,
    ) -> impl Future<Output = Result<StatusUpdate, LedgerError>> + Send;

    /// Returns the numbers of all orders that are not in a terminal status, oldest first.
    fn fetch_unresolved_orders(&self) -> impl Future<Output = Result<Vec<OrderNumber>, LedgerError>> + Send;

    /// Withdraws points from a user's balance against the given order.
    ///
    /// The balance check and the insert are a single atomic unit, so concurrent withdrawals for the same user can
    /// never take the balance below zero. Fails with [`LedgerError::InsufficientFunds`] if the balance does not cover
    /// the amount, and [`LedgerError::InvalidAmount`] if the amount is not positive.
    fn withdraw(&self, withdrawal: NewWithdrawal) -> impl Future<Output = Result<Withdrawal, LedgerError>> + Send;

    /// Closes the database connection.
    fn close(&mut self) -> impl Future<Output = Result<(), LedgerError>> + Send {
        async { Ok(()) }
    }
}
