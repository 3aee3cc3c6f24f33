use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::registrations::{ActivityRegistrantRow, UserRegistrationRow};
use crate::models::RegistrationsRow;

// Insert rides the caller's transaction; uq_registrations_confirmed turns a
// duplicate confirmed registration into a unique-violation error.
const SQL_INSERT_CONFIRMED: &str = r#"
INSERT INTO registrations (
  registration_id,
  user_id,
  activity_id,
  status,
  notes,
  created_at,
  updated_at
) VALUES (?, ?, ?, 'confirmed', ?, ?, ?)
"#;

pub struct NewRegistration<'a> {
    pub registration_id: &'a str,
    pub user_id: &'a str,
    pub activity_id: &'a str,
    pub notes: Option<&'a str>,
    pub created_at: &'a str,
}

pub async fn insert_confirmed<'e, E>(executor: E, reg: NewRegistration<'_>) -> sqlx::Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let res = sqlx::query(SQL_INSERT_CONFIRMED)
        .bind(reg.registration_id)
        .bind(reg.user_id)
        .bind(reg.activity_id)
        .bind(reg.notes)
        .bind(reg.created_at)
        .bind(reg.created_at)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_CANCEL_CONFIRMED: &str = r#"
UPDATE registrations
SET status = 'cancelled', updated_at = ?
WHERE user_id = ? AND activity_id = ? AND status = 'confirmed'
"#;

pub async fn cancel_confirmed<'e, E>(
    executor: E,
    user_id: &str,
    activity_id: &str,
    updated_at: &str,
) -> sqlx::Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let res = sqlx::query(SQL_CANCEL_CONFIRMED)
        .bind(updated_at)
        .bind(user_id)
        .bind(activity_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

// Refunds remove the record outright rather than flipping it to cancelled,
// so a later re-join starts from a clean slate.
const SQL_DELETE_CONFIRMED: &str = r#"
DELETE FROM registrations
WHERE user_id = ? AND activity_id = ? AND status = 'confirmed'
"#;

pub async fn delete_confirmed<'e, E>(
    executor: E,
    user_id: &str,
    activity_id: &str,
) -> sqlx::Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let res = sqlx::query(SQL_DELETE_CONFIRMED)
        .bind(user_id)
        .bind(activity_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_CONFIRMED: &str = r#"
SELECT * FROM registrations
WHERE user_id = ? AND activity_id = ? AND status = 'confirmed'
"#;

pub async fn load_confirmed(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> sqlx::Result<Option<RegistrationsRow>> {
    sqlx::query_as::<_, RegistrationsRow>(SQL_LOAD_CONFIRMED)
        .bind(user_id)
        .bind(activity_id)
        .fetch_optional(pool)
        .await
}

const SQL_LOAD_BY_ID: &str = r#"
SELECT * FROM registrations WHERE registration_id = ?
"#;

pub async fn load_by_id<'e, E>(
    executor: E,
    registration_id: &str,
) -> sqlx::Result<Option<RegistrationsRow>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, RegistrationsRow>(SQL_LOAD_BY_ID)
        .bind(registration_id)
        .fetch_optional(executor)
        .await
}

const SQL_LIST_FOR_USER: &str = r#"
SELECT
  r.registration_id,
  r.activity_id,
  r.status,
  r.notes,
  r.created_at,
  a.title AS activity_title,
  a.start_time AS activity_start_time,
  a.location AS activity_location
FROM registrations r
LEFT JOIN activities a ON a.activity_id = r.activity_id
WHERE r.user_id = ?
ORDER BY datetime(r.created_at) DESC, r.rowid DESC
"#;

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Vec<UserRegistrationRow>> {
    sqlx::query_as::<_, UserRegistrationRow>(SQL_LIST_FOR_USER)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

const SQL_LIST_CONFIRMED_FOR_ACTIVITY: &str = r#"
SELECT
  r.registration_id,
  r.user_id,
  r.notes,
  r.created_at,
  u.username,
  u.real_name,
  u.email,
  u.phone
FROM registrations r
JOIN users u ON u.user_id = r.user_id
WHERE r.activity_id = ? AND r.status = 'confirmed'
ORDER BY datetime(r.created_at) DESC, r.rowid DESC
"#;

pub async fn list_confirmed_for_activity(
    pool: &SqlitePool,
    activity_id: &str,
) -> sqlx::Result<Vec<ActivityRegistrantRow>> {
    sqlx::query_as::<_, ActivityRegistrantRow>(SQL_LIST_CONFIRMED_FOR_ACTIVITY)
        .bind(activity_id)
        .fetch_all(pool)
        .await
}
