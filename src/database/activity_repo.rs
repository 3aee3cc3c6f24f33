use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::ActivitiesRow;

const SQL_INSERT_ACTIVITY: &str = r#"
INSERT INTO activities (
  activity_id,
  title,
  description,
  location,
  category,
  requirements,
  image_url,
  start_time,
  end_time,
  price,
  max_participants,
  current_participants,
  status,
  creator_id,
  is_deleted,
  created_at,
  updated_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 'active', ?, 0, ?, ?)
"#;

pub struct NewActivity<'a> {
    pub activity_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub category: &'a str,
    pub requirements: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub start_time: &'a str,
    pub end_time: &'a str,
    pub price: f64,
    pub max_participants: i64,
    pub creator_id: &'a str,
    pub created_at: &'a str,
}

pub async fn insert_activity(pool: &SqlitePool, activity: NewActivity<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_ACTIVITY)
        .bind(activity.activity_id)
        .bind(activity.title)
        .bind(activity.description)
        .bind(activity.location)
        .bind(activity.category)
        .bind(activity.requirements)
        .bind(activity.image_url)
        .bind(activity.start_time)
        .bind(activity.end_time)
        .bind(activity.price)
        .bind(activity.max_participants)
        .bind(activity.creator_id)
        .bind(activity.created_at)
        .bind(activity.created_at)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_LOAD_BY_ID: &str = r#"
SELECT * FROM activities WHERE activity_id = ?
"#;

// Loads regardless of the soft-delete flag; callers that must not see
// deleted records use load_visible_by_id.
pub async fn load_by_id<'e, E>(executor: E, activity_id: &str) -> sqlx::Result<Option<ActivitiesRow>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ActivitiesRow>(SQL_LOAD_BY_ID)
        .bind(activity_id)
        .fetch_optional(executor)
        .await
}

const SQL_LOAD_VISIBLE_BY_ID: &str = r#"
SELECT * FROM activities WHERE activity_id = ? AND is_deleted = 0
"#;

pub async fn load_visible_by_id<'e, E>(
    executor: E,
    activity_id: &str,
) -> sqlx::Result<Option<ActivitiesRow>>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ActivitiesRow>(SQL_LOAD_VISIBLE_BY_ID)
        .bind(activity_id)
        .fetch_optional(executor)
        .await
}

// Every filter is guarded with the bound-empty-string trick so one prepared
// statement serves all filter combinations. The derived time status is never
// stored; it falls out of the schedule window vs. datetime('now').
const SQL_FILTERS: &str = r#"
WHERE a.is_deleted = 0
  AND (? = '' OR lower(a.title) LIKE ? OR lower(a.description) LIKE ?)
  AND (? = '' OR lower(a.category) IN (lower(?), lower(?), lower(?), lower(?)))
  AND (? = ''
    OR (? = 'open' AND datetime(a.start_time) > datetime('now'))
    OR (? = 'in_progress'
        AND datetime(a.start_time) <= datetime('now')
        AND datetime(a.end_time) >= datetime('now'))
    OR (? = 'completed' AND datetime(a.end_time) < datetime('now')))
  AND (? = '' OR datetime(a.start_time) >= datetime(?))
  AND (? = '' OR datetime(a.start_time) <= datetime(?))
"#;

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub q_like: String,
    pub categories: Vec<String>,
    pub time_status: String,
    pub start_date: String,
    pub end_date: String,
}

impl ActivityFilter {
    // The IN list is padded to a fixed width so the statement shape stays constant.
    fn padded_categories(&self) -> [String; 4] {
        let first = self.categories.first().cloned().unwrap_or_default();
        [
            first.clone(),
            self.categories.get(1).cloned().unwrap_or_else(|| first.clone()),
            self.categories.get(2).cloned().unwrap_or_else(|| first.clone()),
            self.categories.get(3).cloned().unwrap_or(first),
        ]
    }

    fn category_flag(&self) -> &'static str {
        if self.categories.is_empty() {
            ""
        } else {
            "x"
        }
    }
}

pub async fn list_filtered(
    pool: &SqlitePool,
    filter: &ActivityFilter,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<ActivitiesRow>> {
    let sql = format!(
        "SELECT a.* FROM activities a\n{SQL_FILTERS}\nORDER BY datetime(a.created_at) DESC, a.rowid DESC\nLIMIT ? OFFSET ?"
    );
    let padded = filter.padded_categories();
    sqlx::query_as::<_, ActivitiesRow>(&sql)
        .bind(&filter.q_like)
        .bind(&filter.q_like)
        .bind(&filter.q_like)
        .bind(filter.category_flag())
        .bind(&padded[0])
        .bind(&padded[1])
        .bind(&padded[2])
        .bind(&padded[3])
        .bind(&filter.time_status)
        .bind(&filter.time_status)
        .bind(&filter.time_status)
        .bind(&filter.time_status)
        .bind(&filter.start_date)
        .bind(&filter.start_date)
        .bind(&filter.end_date)
        .bind(&filter.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_filtered(pool: &SqlitePool, filter: &ActivityFilter) -> sqlx::Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM activities a\n{SQL_FILTERS}");
    let padded = filter.padded_categories();
    sqlx::query_scalar::<_, i64>(&sql)
        .bind(&filter.q_like)
        .bind(&filter.q_like)
        .bind(&filter.q_like)
        .bind(filter.category_flag())
        .bind(&padded[0])
        .bind(&padded[1])
        .bind(&padded[2])
        .bind(&padded[3])
        .bind(&filter.time_status)
        .bind(&filter.time_status)
        .bind(&filter.time_status)
        .bind(&filter.time_status)
        .bind(&filter.start_date)
        .bind(&filter.start_date)
        .bind(&filter.end_date)
        .bind(&filter.end_date)
        .fetch_one(pool)
        .await
}

const SQL_LIST_BY_CREATOR: &str = r#"
SELECT * FROM activities
WHERE creator_id = ? AND is_deleted = 0
ORDER BY datetime(created_at) DESC, rowid DESC
"#;

pub async fn list_by_creator(pool: &SqlitePool, creator_id: &str) -> sqlx::Result<Vec<ActivitiesRow>> {
    sqlx::query_as::<_, ActivitiesRow>(SQL_LIST_BY_CREATOR)
        .bind(creator_id)
        .fetch_all(pool)
        .await
}

const SQL_UPDATE_ACTIVITY: &str = r#"
UPDATE activities
SET title = COALESCE(?, title),
    description = COALESCE(?, description),
    location = COALESCE(?, location),
    category = COALESCE(?, category),
    requirements = COALESCE(?, requirements),
    image_url = COALESCE(?, image_url),
    start_time = COALESCE(?, start_time),
    end_time = COALESCE(?, end_time),
    price = COALESCE(?, price),
    max_participants = COALESCE(?, max_participants),
    status = COALESCE(?, status),
    updated_at = ?
WHERE activity_id = ? AND is_deleted = 0
"#;

#[derive(Debug, Default)]
pub struct ActivityPatch<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub category: Option<&'a str>,
    pub requirements: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub start_time: Option<&'a str>,
    pub end_time: Option<&'a str>,
    pub price: Option<f64>,
    pub max_participants: Option<i64>,
    pub status: Option<&'a str>,
}

pub async fn update_activity(
    pool: &SqlitePool,
    activity_id: &str,
    patch: ActivityPatch<'_>,
    updated_at: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_ACTIVITY)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.location)
        .bind(patch.category)
        .bind(patch.requirements)
        .bind(patch.image_url)
        .bind(patch.start_time)
        .bind(patch.end_time)
        .bind(patch.price)
        .bind(patch.max_participants)
        .bind(patch.status)
        .bind(updated_at)
        .bind(activity_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_SOFT_DELETE: &str = r#"
UPDATE activities SET is_deleted = 1, updated_at = ? WHERE activity_id = ? AND is_deleted = 0
"#;

pub async fn soft_delete(pool: &SqlitePool, activity_id: &str, updated_at: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SOFT_DELETE)
        .bind(updated_at)
        .bind(activity_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// The capacity primitive. The WHERE clause re-checks the bound, so the check
// and the mutation are one statement and SQLite's single-writer lock is the
// serialization point: two callers racing for the last seat cannot both match.
// Returns the number of affected rows; 0 means the window would be violated
// (or the activity is missing/deleted) and nothing was changed.
const SQL_ADJUST_PARTICIPANTS: &str = r#"
UPDATE activities
SET current_participants = current_participants + ?,
    updated_at = ?
WHERE activity_id = ?
  AND is_deleted = 0
  AND current_participants + ? >= 0
  AND current_participants + ? <= max_participants
"#;

pub async fn try_adjust_participants<'e, E>(
    executor: E,
    activity_id: &str,
    delta: i64,
    updated_at: &str,
) -> sqlx::Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let res = sqlx::query(SQL_ADJUST_PARTICIPANTS)
        .bind(delta)
        .bind(updated_at)
        .bind(activity_id)
        .bind(delta)
        .bind(delta)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}
