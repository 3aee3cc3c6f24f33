use sqlx::SqlitePool;

use crate::models::UsersRow;

const SQL_INSERT_USER: &str = r#"
INSERT INTO users (
  user_id,
  username,
  email,
  password_hash,
  phone,
  role,
  real_name,
  is_active,
  created_at,
  updated_at
) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
"#;

pub struct NewUser<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
    pub real_name: Option<&'a str>,
    pub created_at: &'a str,
}

pub async fn insert_user(pool: &SqlitePool, user: NewUser<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_USER)
        .bind(user.user_id)
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.phone)
        .bind(user.role)
        .bind(user.real_name)
        .bind(user.created_at)
        .bind(user.created_at)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_BY_ID: &str = r#"
SELECT * FROM users WHERE user_id = ?
"#;

pub async fn load_by_id(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_LOAD_BY_ID)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

const SQL_LOAD_ACTIVE_BY_ID: &str = r#"
SELECT * FROM users WHERE user_id = ? AND is_active = 1
"#;

pub async fn load_active_by_id(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_LOAD_ACTIVE_BY_ID)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

const SQL_LOAD_ACTIVE_BY_USERNAME: &str = r#"
SELECT * FROM users WHERE username = ? AND is_active = 1
"#;

pub async fn load_active_by_username(
    pool: &SqlitePool,
    username: &str,
) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_LOAD_ACTIVE_BY_USERNAME)
        .bind(username)
        .fetch_optional(pool)
        .await
}

const SQL_USERNAME_EXISTS: &str = r#"
SELECT COUNT(*) FROM users WHERE username = ?
"#;

pub async fn username_exists(pool: &SqlitePool, username: &str) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(SQL_USERNAME_EXISTS)
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

const SQL_EMAIL_TAKEN_BY_OTHER: &str = r#"
SELECT COUNT(*) FROM users WHERE email = ? AND user_id != ?
"#;

// Pass an empty id to check against all users.
pub async fn email_taken_by_other(
    pool: &SqlitePool,
    email: &str,
    user_id: &str,
) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(SQL_EMAIL_TAKEN_BY_OTHER)
        .bind(email)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

// COALESCE keeps the stored value for any field the caller did not patch.
const SQL_UPDATE_PROFILE: &str = r#"
UPDATE users
SET email = COALESCE(?, email),
    phone = COALESCE(?, phone),
    real_name = COALESCE(?, real_name),
    updated_at = ?
WHERE user_id = ?
"#;

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    email: Option<&str>,
    phone: Option<&str>,
    real_name: Option<&str>,
    updated_at: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_PROFILE)
        .bind(email)
        .bind(phone)
        .bind(real_name)
        .bind(updated_at)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DEACTIVATE: &str = r#"
UPDATE users SET is_active = 0, updated_at = ? WHERE user_id = ? AND is_active = 1
"#;

pub async fn deactivate(pool: &SqlitePool, user_id: &str, updated_at: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DEACTIVATE)
        .bind(updated_at)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
