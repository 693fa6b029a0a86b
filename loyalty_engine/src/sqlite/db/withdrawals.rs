use sqlx::SqliteConnection;

use crate::db_types::{NewWithdrawal, UserId, Withdrawal};

/// Inserts the withdrawal if, and only if, the user's balance covers the amount.
///
/// The balance check and the insert are one statement, so no other writer can slip in between them. Returns `None`
/// if the balance was insufficient.
pub async fn insert_withdrawal_if_funded(
    withdrawal: &NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Option<Withdrawal>, sqlx::Error> {
    let result = sqlx::query_as(
        r#"
        INSERT INTO withdrawals (user_id, order_number, amount)
        SELECT $1, $2, $3
        WHERE (
            COALESCE((SELECT SUM(accrual) FROM orders WHERE user_id = $1 AND status = 'PROCESSED'), 0) -
            COALESCE((SELECT SUM(amount) FROM withdrawals WHERE user_id = $1), 0)
        ) >= $3
        RETURNING *
        "#,
    )
    .bind(&withdrawal.user_id)
    .bind(&withdrawal.order_number)
    .bind(withdrawal.amount)
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Returns all withdrawals for the user, oldest first.
pub async fn fetch_withdrawals_for_user(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let withdrawals = sqlx::query_as("SELECT * FROM withdrawals WHERE user_id = $1 ORDER BY processed_at ASC, id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(withdrawals)
}
