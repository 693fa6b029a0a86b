use sqlx::SqliteConnection;

use crate::db_types::{Points, UserBalance, UserId};

/// Calculates the balance for the user in a single statement, which gives a consistent snapshot of orders and
/// withdrawals.
pub async fn fetch_balance(user_id: &UserId, conn: &mut SqliteConnection) -> Result<UserBalance, sqlx::Error> {
    let (accrued, withdrawn): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COALESCE((SELECT SUM(accrual) FROM orders WHERE user_id = $1 AND status = 'PROCESSED'), 0) AS accrued,
            COALESCE((SELECT SUM(amount) FROM withdrawals WHERE user_id = $1), 0) AS withdrawn
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(UserBalance::new(Points::from(accrued), Points::from(withdrawn)))
}
