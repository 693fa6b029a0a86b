use std::future::Future;

use crate::{
    db_types::{Order, OrderNumber, UserBalance, UserId, Withdrawal},
    traits::LedgerError,
};

/// The `LedgerQueries` trait provides read-only access to the ledger on behalf of users.
///
/// Every method is answered from a single statement, so each result is a consistent snapshot.
pub trait LedgerQueries {
    /// Fetches a single order. If no such order exists, `None` is returned.
    fn fetch_order(&self, number: &OrderNumber) -> impl Future<Output = Result<Option<Order>, LedgerError>> + Send;

    /// Fetches all orders registered by the user, oldest upload first.
    fn fetch_orders_for_user(&self, user_id: &UserId) -> impl Future<Output = Result<Vec<Order>, LedgerError>> + Send;

    /// Fetches all withdrawals made by the user, oldest first.
    fn fetch_withdrawals_for_user(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<Withdrawal>, LedgerError>> + Send;

    /// Calculates the user's current balance and total withdrawn.
    fn fetch_balance(&self, user_id: &UserId) -> impl Future<Output = Result<UserBalance, LedgerError>> + Send;
}
