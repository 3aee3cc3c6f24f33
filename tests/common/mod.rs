#![allow(dead_code)]

//! Shared fixtures: a throwaway on-disk SQLite database per test (WAL +
//! busy timeout, same knobs as production, so concurrency tests exercise the
//! real locking behavior) plus helpers for seeding users and activities.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use sportmeet::database::schema;
use sportmeet::services::activity_service::{self, CreateActivityInput};
use sportmeet::services::user_service::{self, RegisterUserInput};

pub const TEST_SECRET: &str = "test-secret";

pub async fn test_pool() -> SqlitePool {
    let path = std::env::temp_dir().join(format!("sportmeet-test-{}.db", uuid::Uuid::new_v4()));
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("test database");
    schema::ensure_schema(&pool).await.expect("schema bootstrap");
    pool
}

pub async fn register_user(pool: &SqlitePool, username: &str) -> String {
    user_service::register_user(
        pool,
        RegisterUserInput {
            username: username.to_string(),
            password: "correct-horse".to_string(),
            email: format!("{username}@example.com"),
            phone: None,
            real_name: None,
        },
    )
    .await
    .expect("register user")
    .id
}

pub fn future_time(hours_from_now: i64) -> String {
    (Utc::now() + ChronoDuration::hours(hours_from_now))
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub async fn create_activity(
    pool: &SqlitePool,
    creator_id: &str,
    max_participants: i64,
    price: f64,
) -> String {
    create_activity_titled(pool, creator_id, max_participants, price, "Friendly match", "football")
        .await
}

pub async fn create_activity_titled(
    pool: &SqlitePool,
    creator_id: &str,
    max_participants: i64,
    price: f64,
    title: &str,
    category: &str,
) -> String {
    activity_service::create_activity(
        pool,
        CreateActivityInput {
            title: title.to_string(),
            description: "Bring your own gear.".to_string(),
            location: "City park".to_string(),
            category: category.to_string(),
            start_time: future_time(24),
            end_time: future_time(26),
            price: Some(price),
            max_participants,
            image_url: None,
            requirements: None,
        },
        creator_id,
    )
    .await
    .expect("create activity")
    .id
}

/// Rewrites the schedule window so the activity started in the past.
pub async fn backdate_activity(pool: &SqlitePool, activity_id: &str) {
    sqlx::query("UPDATE activities SET start_time = ?, end_time = ? WHERE activity_id = ?")
        .bind("2020-01-01 10:00:00")
        .bind("2020-01-01 12:00:00")
        .bind(activity_id)
        .execute(pool)
        .await
        .expect("backdate activity");
}

pub async fn participant_count(pool: &SqlitePool, activity_id: &str) -> i64 {
    sqlx::query_scalar("SELECT current_participants FROM activities WHERE activity_id = ?")
        .bind(activity_id)
        .fetch_one(pool)
        .await
        .expect("participant count")
}

pub async fn confirmed_registration_exists(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
) -> bool {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM registrations WHERE user_id = ? AND activity_id = ? AND status = 'confirmed'",
    )
    .bind(user_id)
    .bind(activity_id)
    .fetch_one(pool)
    .await
    .expect("registration lookup");
    count > 0
}

pub async fn order_status(pool: &SqlitePool, order_number: &str) -> String {
    sqlx::query_scalar("SELECT status FROM orders WHERE order_number = ?")
        .bind(order_number)
        .fetch_one(pool)
        .await
        .expect("order status")
}

/// The standing capacity invariant: 0 <= current <= max.
pub async fn assert_capacity_invariant(pool: &SqlitePool, activity_id: &str) {
    let (current, max): (i64, i64) = sqlx::query_as(
        "SELECT current_participants, max_participants FROM activities WHERE activity_id = ?",
    )
    .bind(activity_id)
    .fetch_one(pool)
    .await
    .expect("activity row");
    assert!(
        (0..=max).contains(&current),
        "capacity invariant violated: current={current}, max={max}"
    );
}
