use sqlx::SqlitePool;

use crate::models::comments::{ActivityCommentRow, RatingCountRow};
use crate::models::CommentsRow;

// uq_comments_user_activity turns a second comment on the same activity into
// a unique-violation error.
const SQL_INSERT_COMMENT: &str = r#"
INSERT INTO comments (
  comment_id,
  user_id,
  activity_id,
  content,
  rating,
  created_at
) VALUES (?, ?, ?, ?, ?, ?)
"#;

pub struct NewComment<'a> {
    pub comment_id: &'a str,
    pub user_id: &'a str,
    pub activity_id: &'a str,
    pub content: &'a str,
    pub rating: Option<i64>,
    pub created_at: &'a str,
}

pub async fn insert_comment(pool: &SqlitePool, comment: NewComment<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_COMMENT)
        .bind(comment.comment_id)
        .bind(comment.user_id)
        .bind(comment.activity_id)
        .bind(comment.content)
        .bind(comment.rating)
        .bind(comment.created_at)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_BY_ID: &str = r#"
SELECT * FROM comments WHERE comment_id = ?
"#;

pub async fn load_by_id(pool: &SqlitePool, comment_id: &str) -> sqlx::Result<Option<CommentsRow>> {
    sqlx::query_as::<_, CommentsRow>(SQL_LOAD_BY_ID)
        .bind(comment_id)
        .fetch_optional(pool)
        .await
}

const SQL_LIST_FOR_ACTIVITY: &str = r#"
SELECT
  c.comment_id,
  c.user_id,
  c.activity_id,
  c.content,
  c.rating,
  c.created_at,
  u.username,
  u.real_name
FROM comments c
LEFT JOIN users u ON u.user_id = c.user_id
WHERE c.activity_id = ?
ORDER BY datetime(c.created_at) DESC, c.rowid DESC
LIMIT ? OFFSET ?
"#;

pub async fn list_for_activity(
    pool: &SqlitePool,
    activity_id: &str,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<ActivityCommentRow>> {
    sqlx::query_as::<_, ActivityCommentRow>(SQL_LIST_FOR_ACTIVITY)
        .bind(activity_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

const SQL_COUNT_FOR_ACTIVITY: &str = r#"
SELECT COUNT(*) FROM comments WHERE activity_id = ?
"#;

pub async fn count_for_activity(pool: &SqlitePool, activity_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar(SQL_COUNT_FOR_ACTIVITY)
        .bind(activity_id)
        .fetch_one(pool)
        .await
}

// AVG over rated comments only; unrated comments carry no opinion.
const SQL_AVERAGE_RATING: &str = r#"
SELECT AVG(rating) FROM comments WHERE activity_id = ? AND rating IS NOT NULL
"#;

pub async fn average_rating(pool: &SqlitePool, activity_id: &str) -> sqlx::Result<Option<f64>> {
    sqlx::query_scalar(SQL_AVERAGE_RATING)
        .bind(activity_id)
        .fetch_one(pool)
        .await
}

const SQL_RATING_COUNTS: &str = r#"
SELECT rating, COUNT(*) AS rating_count
FROM comments
WHERE activity_id = ? AND rating IS NOT NULL
GROUP BY rating
"#;

pub async fn rating_counts(
    pool: &SqlitePool,
    activity_id: &str,
) -> sqlx::Result<Vec<RatingCountRow>> {
    sqlx::query_as::<_, RatingCountRow>(SQL_RATING_COUNTS)
        .bind(activity_id)
        .fetch_all(pool)
        .await
}

const SQL_LIST_FOR_USER: &str = r#"
SELECT
  c.comment_id,
  c.user_id,
  c.activity_id,
  c.content,
  c.rating,
  c.created_at,
  u.username,
  u.real_name
FROM comments c
LEFT JOIN users u ON u.user_id = c.user_id
WHERE c.user_id = ?
ORDER BY datetime(c.created_at) DESC, c.rowid DESC
"#;

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Vec<ActivityCommentRow>> {
    sqlx::query_as::<_, ActivityCommentRow>(SQL_LIST_FOR_USER)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

const SQL_DELETE_BY_ID: &str = r#"
DELETE FROM comments WHERE comment_id = ?
"#;

pub async fn delete_by_id(pool: &SqlitePool, comment_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_BY_ID)
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
