use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::orders::OrderStatusCountRow;
use crate::models::OrdersRow;

// Two unique constraints can fire here: orders.order_number (number collision,
// retried by the service) and uq_orders_pending (duplicate pending order,
// surfaced to the caller).
const SQL_INSERT_ORDER: &str = r#"
INSERT INTO orders (
  order_id,
  order_number,
  user_id,
  activity_id,
  activity_title,
  amount,
  status,
  payment_status,
  notes,
  created_at,
  updated_at
) VALUES (?, ?, ?, ?, ?, ?, 'pending', 'pending', ?, ?, ?)
"#;

pub struct NewOrder<'a> {
    pub order_id: &'a str,
    pub order_number: &'a str,
    pub user_id: &'a str,
    pub activity_id: &'a str,
    pub activity_title: &'a str,
    pub amount: f64,
    pub notes: Option<&'a str>,
    pub created_at: &'a str,
}

pub async fn insert_order(pool: &SqlitePool, order: NewOrder<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_ORDER)
        .bind(order.order_id)
        .bind(order.order_number)
        .bind(order.user_id)
        .bind(order.activity_id)
        .bind(order.activity_title)
        .bind(order.amount)
        .bind(order.notes)
        .bind(order.created_at)
        .bind(order.created_at)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_BY_NUMBER: &str = r#"
SELECT * FROM orders WHERE order_number = ? AND user_id = ?
"#;

pub async fn load_by_number<'e, E>(
    executor: E,
    order_number: &str,
    user_id: &str,
) -> sqlx::Result<Option<OrdersRow>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, OrdersRow>(SQL_LOAD_BY_NUMBER)
        .bind(order_number)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

// Status transitions are conditional updates: the WHERE clause names the only
// legal source state, and the affected-row count tells the caller whether the
// transition actually happened.
const SQL_MARK_PAID: &str = r#"
UPDATE orders
SET status = 'paid', payment_status = 'success', updated_at = ?
WHERE order_number = ? AND user_id = ? AND status = 'pending'
"#;

pub async fn mark_paid<'e, E>(
    executor: E,
    order_number: &str,
    user_id: &str,
    updated_at: &str,
) -> sqlx::Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let res = sqlx::query(SQL_MARK_PAID)
        .bind(updated_at)
        .bind(order_number)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_MARK_CANCELLED: &str = r#"
UPDATE orders
SET status = 'cancelled', updated_at = ?
WHERE order_number = ? AND user_id = ? AND status = 'pending'
"#;

pub async fn mark_cancelled<'e, E>(
    executor: E,
    order_number: &str,
    user_id: &str,
    updated_at: &str,
) -> sqlx::Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let res = sqlx::query(SQL_MARK_CANCELLED)
        .bind(updated_at)
        .bind(order_number)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_MARK_REFUNDED: &str = r#"
UPDATE orders
SET status = 'refunded', updated_at = ?
WHERE order_number = ? AND user_id = ? AND status = 'paid'
"#;

pub async fn mark_refunded<'e, E>(
    executor: E,
    order_number: &str,
    user_id: &str,
    updated_at: &str,
) -> sqlx::Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let res = sqlx::query(SQL_MARK_REFUNDED)
        .bind(updated_at)
        .bind(order_number)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LIST_FOR_USER: &str = r#"
SELECT * FROM orders
WHERE user_id = ? AND (? = '' OR status = ?)
ORDER BY datetime(created_at) DESC, rowid DESC
"#;

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    status: &str,
) -> sqlx::Result<Vec<OrdersRow>> {
    sqlx::query_as::<_, OrdersRow>(SQL_LIST_FOR_USER)
        .bind(user_id)
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await
}

const SQL_STATUS_COUNTS: &str = r#"
SELECT status, COUNT(*) AS order_count, SUM(amount) AS amount_sum
FROM orders
WHERE user_id = ?
GROUP BY status
"#;

pub async fn status_counts(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Vec<OrderStatusCountRow>> {
    sqlx::query_as::<_, OrderStatusCountRow>(SQL_STATUS_COUNTS)
        .bind(user_id)
        .fetch_all(pool)
        .await
}
