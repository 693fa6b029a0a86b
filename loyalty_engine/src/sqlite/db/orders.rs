use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderNumber, OrderStatusType, Points, UserId},
    traits::{LedgerError, StatusUpdate},
};

/// Inserts a new order into the database in the `NEW` status.
///
/// The order number is the primary key, so a concurrent registration of the same number fails with a unique
/// violation. When that happens, the existing row is inspected to tell the caller who owns it. The existing row is
/// never modified.
pub async fn insert_order(
    number: &OrderNumber,
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Order, LedgerError> {
    let result = sqlx::query_as("INSERT INTO orders (number, user_id, status) VALUES ($1, $2, $3) RETURNING *")
        .bind(number)
        .bind(user_id)
        .bind(OrderStatusType::New)
        .fetch_one(&mut *conn)
        .await;
    match result {
        Ok(order) => {
            debug!("📝️ Order {number} inserted for user {user_id}");
            Ok(order)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            let existing = fetch_order(number, conn).await?.ok_or_else(|| {
                LedgerError::DatabaseError(format!("Order {number} violates uniqueness, but could not be found"))
            })?;
            if existing.user_id == *user_id {
                trace!("📝️ Order {number} was already registered by {user_id}");
                Err(LedgerError::AlreadyOwnedBySameUser(number.clone()))
            } else {
                debug!("📝️ User {user_id} tried to register order {number}, which belongs to {}", existing.user_id);
                Err(LedgerError::OwnedByAnotherUser(number.clone()))
            }
        },
        Err(e) => Err(e.into()),
    }
}

/// Returns the order with the given number, if it exists.
pub async fn fetch_order(number: &OrderNumber, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE number = $1").bind(number).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns all the orders registered by the given user, oldest first.
pub async fn fetch_orders_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY uploaded_at ASC, rowid ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Returns the numbers of every order that has not reached a terminal status, oldest first.
pub async fn fetch_unresolved_orders(conn: &mut SqliteConnection) -> Result<Vec<OrderNumber>, sqlx::Error> {
    let numbers = sqlx::query_scalar(
        "SELECT number FROM orders WHERE status NOT IN ('INVALID', 'PROCESSED') ORDER BY uploaded_at ASC, rowid ASC",
    )
    .fetch_all(conn)
    .await?;
    Ok(numbers)
}

/// Sets the status and accrual of an order together. This is not atomic on its own when the order is terminal, since
/// a second query is needed to fetch the unchanged record. Embed the call in a transaction and pass `&mut *tx` as the
/// connection argument.
///
/// Orders in a terminal status are never modified.
pub(crate) async fn update_order_status(
    number: &OrderNumber,
    status: OrderStatusType,
    accrual: Option<Points>,
    conn: &mut SqliteConnection,
) -> Result<StatusUpdate, LedgerError> {
    let updated: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET status = $1, accrual = $2, updated_at = CURRENT_TIMESTAMP
        WHERE number = $3 AND status NOT IN ('INVALID', 'PROCESSED')
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(accrual)
    .bind(number)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(order) = updated {
        trace!("📝️ Order {number} is now {status}");
        return Ok(StatusUpdate::Updated(order));
    }
    match fetch_order(number, conn).await? {
        Some(order) => {
            debug!("📝️ Order {number} is already {}. Ignoring update to {status}", order.status);
            Ok(StatusUpdate::AlreadyTerminal(order))
        },
        None => Err(LedgerError::OrderNotFound(number.clone())),
    }
}
