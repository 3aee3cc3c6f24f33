//! Order ledger. An order holds no seat while pending; the seat is claimed at
//! pay time, inside the same transaction that flips the order to paid and
//! writes the confirmed registration. Refunds reverse those three effects in
//! one transaction as well.

use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::{activity_repo, order_repo, registration_repo};
use crate::models::OrdersRow;
use crate::services::error::{is_unique_violation, ServiceError, ServiceResult};
use crate::services::timefmt;

// Collisions on the random suffix are detected via the UNIQUE column and
// retried with a fresh number.
const ORDER_NUMBER_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub activity_id: String,
    pub activity_title: String,
    pub amount: f64,
    pub status: String,
    pub payment_status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatsView {
    pub total_orders: i64,
    pub paid_orders: i64,
    pub pending_orders: i64,
    pub cancelled_orders: i64,
    pub total_amount: f64,
}

fn to_view(row: OrdersRow) -> OrderView {
    OrderView {
        id: row.order_id,
        order_number: row.order_number,
        user_id: row.user_id,
        activity_id: row.activity_id,
        activity_title: row.activity_title,
        amount: row.amount,
        status: row.status,
        payment_status: row.payment_status,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn generate_order_number() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("ORD{millis}{suffix:03}")
}

fn is_order_number_collision(err: &sqlx::Error) -> bool {
    is_unique_violation(err)
        && err
            .as_database_error()
            .map(|db| db.message().contains("order_number"))
            .unwrap_or(false)
}

// Preconditions here are advisory (they produce friendly errors at order
// time); the authoritative capacity check happens again at pay time under
// the write lock.
pub async fn create_order(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
    notes: Option<&str>,
) -> ServiceResult<OrderView> {
    let now = timefmt::now();
    let activity = activity_repo::load_visible_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("activity not found or closed".to_string()))?;
    if activity.current_participants >= activity.max_participants {
        return Err(ServiceError::Capacity("activity is full".to_string()));
    }
    if activity.start_time <= now {
        return Err(ServiceError::InvalidState(
            "activity has already started".to_string(),
        ));
    }

    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let order_id = Uuid::new_v4().to_string();
        let order_number = generate_order_number();
        let inserted = order_repo::insert_order(
            pool,
            order_repo::NewOrder {
                order_id: &order_id,
                order_number: &order_number,
                user_id,
                activity_id,
                activity_title: &activity.title,
                amount: activity.price,
                notes,
                created_at: &now,
            },
        )
        .await;

        match inserted {
            Ok(_) => return get_order(pool, &order_number, user_id).await,
            Err(e) if is_order_number_collision(&e) => continue,
            Err(e) if is_unique_violation(&e) => {
                return Err(ServiceError::Duplicate(
                    "a pending order for this activity already exists".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ServiceError::Internal(
        "could not allocate a unique order number".to_string(),
    ))
}

pub async fn get_order(
    pool: &SqlitePool,
    order_number: &str,
    user_id: &str,
) -> ServiceResult<OrderView> {
    let row = order_repo::load_by_number(pool, order_number, user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("order not found".to_string()))?;
    Ok(to_view(row))
}

pub async fn list_user_orders(
    pool: &SqlitePool,
    user_id: &str,
    status: Option<&str>,
) -> ServiceResult<Vec<OrderView>> {
    let status = status.unwrap_or("").trim();
    let rows = order_repo::list_for_user(pool, user_id, status).await?;
    Ok(rows.into_iter().map(to_view).collect())
}

// Paying is the all-or-nothing step: pending->paid flip, seat claim and
// confirmed registration either all land or none do.
pub async fn pay_order(
    pool: &SqlitePool,
    order_number: &str,
    user_id: &str,
) -> ServiceResult<OrderView> {
    let now = timefmt::now();
    let mut tx = pool.begin().await?;

    let flipped = order_repo::mark_paid(&mut *tx, order_number, user_id, &now).await?;
    if flipped == 0 {
        let order = order_repo::load_by_number(&mut *tx, order_number, user_id).await?;
        tx.rollback().await?;
        return Err(match order {
            None => ServiceError::NotFound("order not found".to_string()),
            Some(o) => ServiceError::InvalidState(format!(
                "order is {}; only pending orders can be paid",
                o.status
            )),
        });
    }

    let order = order_repo::load_by_number(&mut *tx, order_number, user_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("order vanished mid-transaction".to_string()))?;

    // Activity state may have moved since the order was created; re-validate
    // under the write lock.
    let reserved =
        activity_repo::try_adjust_participants(&mut *tx, &order.activity_id, 1, &now).await?;
    if reserved == 0 {
        let activity = activity_repo::load_visible_by_id(&mut *tx, &order.activity_id).await?;
        tx.rollback().await?;
        return Err(match activity {
            None => ServiceError::NotFound("activity not found or closed".to_string()),
            Some(_) => ServiceError::Capacity("activity is full".to_string()),
        });
    }

    let activity = activity_repo::load_visible_by_id(&mut *tx, &order.activity_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("activity vanished mid-transaction".to_string()))?;
    if activity.start_time <= now {
        tx.rollback().await?;
        return Err(ServiceError::InvalidState(
            "activity has already started; the order can no longer be paid".to_string(),
        ));
    }

    let registration_id = Uuid::new_v4().to_string();
    let inserted = registration_repo::insert_confirmed(
        &mut *tx,
        registration_repo::NewRegistration {
            registration_id: &registration_id,
            user_id,
            activity_id: &order.activity_id,
            notes: order.notes.as_deref(),
            created_at: &now,
        },
    )
    .await;

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            tx.rollback().await?;
            return Err(ServiceError::Duplicate(
                "already registered for this activity".to_string(),
            ));
        }
        Err(e) => {
            tx.rollback().await?;
            return Err(e.into());
        }
    }

    let paid = order_repo::load_by_number(&mut *tx, order_number, user_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("order vanished mid-transaction".to_string()))?;
    tx.commit().await?;
    Ok(to_view(paid))
}

// A pending order cancels with no side effects. Cancelling a paid order is a
// refund and reverses the payment's effects symmetrically.
pub async fn cancel_order(
    pool: &SqlitePool,
    order_number: &str,
    user_id: &str,
) -> ServiceResult<OrderView> {
    let now = timefmt::now();
    let mut tx = pool.begin().await?;

    let cancelled = order_repo::mark_cancelled(&mut *tx, order_number, user_id, &now).await?;
    if cancelled == 1 {
        let row = order_repo::load_by_number(&mut *tx, order_number, user_id)
            .await?
            .ok_or_else(|| ServiceError::Internal("order vanished mid-transaction".to_string()))?;
        tx.commit().await?;
        return Ok(to_view(row));
    }

    let Some(order) = order_repo::load_by_number(&mut *tx, order_number, user_id).await? else {
        tx.rollback().await?;
        return Err(ServiceError::NotFound("order not found".to_string()));
    };

    match order.status.as_str() {
        "paid" => {
            reverse_paid_order(&mut tx, &order, &now).await?;
            let row = order_repo::load_by_number(&mut *tx, order_number, user_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::Internal("order vanished mid-transaction".to_string())
                })?;
            tx.commit().await?;
            Ok(to_view(row))
        }
        "cancelled" => {
            tx.rollback().await?;
            Err(ServiceError::InvalidState("order is already cancelled".to_string()))
        }
        "refunded" => {
            tx.rollback().await?;
            Err(ServiceError::InvalidState("order is already refunded".to_string()))
        }
        other => {
            tx.rollback().await?;
            Err(ServiceError::InvalidState(format!(
                "order is {other} and cannot be cancelled"
            )))
        }
    }
}

// Refund on request: paid orders only, and only while the activity has not
// started. (Cancelling a paid order skips the start-time cut-off; that path
// exists for organizer-side cancellations after the fact.)
pub async fn refund_order(
    pool: &SqlitePool,
    order_number: &str,
    user_id: &str,
) -> ServiceResult<OrderView> {
    let now = timefmt::now();
    let mut tx = pool.begin().await?;

    let refunded = order_repo::mark_refunded(&mut *tx, order_number, user_id, &now).await?;
    if refunded == 0 {
        let order = order_repo::load_by_number(&mut *tx, order_number, user_id).await?;
        tx.rollback().await?;
        return Err(match order {
            None => ServiceError::NotFound("order not found".to_string()),
            Some(_) => ServiceError::InvalidState(
                "only paid orders can be refunded".to_string(),
            ),
        });
    }

    let order = order_repo::load_by_number(&mut *tx, order_number, user_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("order vanished mid-transaction".to_string()))?;

    if let Some(activity) = activity_repo::load_by_id(&mut *tx, &order.activity_id).await? {
        if activity.start_time <= now {
            tx.rollback().await?;
            return Err(ServiceError::InvalidState(
                "activity has already started; the order can no longer be refunded".to_string(),
            ));
        }
    }

    release_registration(&mut tx, &order, &now).await?;

    let row = order_repo::load_by_number(&mut *tx, order_number, user_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("order vanished mid-transaction".to_string()))?;
    tx.commit().await?;
    Ok(to_view(row))
}

async fn reverse_paid_order(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order: &OrdersRow,
    now: &str,
) -> ServiceResult<()> {
    let refunded =
        order_repo::mark_refunded(&mut **tx, &order.order_number, &order.user_id, now).await?;
    if refunded == 0 {
        return Err(ServiceError::Internal(
            "paid order refused the refund transition".to_string(),
        ));
    }
    release_registration(tx, order, now).await
}

// The counter is released only when a confirmed registration was actually
// removed; if the user cancelled the registration separately, the seat has
// already been given back.
async fn release_registration(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order: &OrdersRow,
    now: &str,
) -> ServiceResult<()> {
    let removed =
        registration_repo::delete_confirmed(&mut **tx, &order.user_id, &order.activity_id).await?;
    if removed > 0 {
        let released =
            activity_repo::try_adjust_participants(&mut **tx, &order.activity_id, -1, now).await?;
        if released == 0 {
            return Err(ServiceError::Internal(
                "participant counter out of sync with registrations".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn order_stats(pool: &SqlitePool, user_id: &str) -> ServiceResult<OrderStatsView> {
    let rows = order_repo::status_counts(pool, user_id).await?;

    let mut stats = OrderStatsView {
        total_orders: 0,
        paid_orders: 0,
        pending_orders: 0,
        cancelled_orders: 0,
        total_amount: 0.0,
    };
    for row in rows {
        stats.total_orders += row.order_count;
        match row.status.as_str() {
            "paid" => {
                stats.paid_orders += row.order_count;
                stats.total_amount += row.amount_sum.unwrap_or(0.0);
            }
            "pending" => stats.pending_orders += row.order_count,
            "cancelled" | "refunded" => stats.cancelled_orders += row.order_count,
            _ => {}
        }
    }
    Ok(stats)
}
