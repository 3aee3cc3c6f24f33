use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::activity_repo::{self, ActivityFilter, ActivityPatch};
use crate::models::ActivitiesRow;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::timefmt;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

// Canonical category synonym sets; a search for any member matches all of
// them. Anything not listed matches only itself.
const CATEGORY_SYNONYMS: &[&[&str]] = &[
    &["football", "soccer"],
    &["table tennis", "ping pong"],
    &["running", "jogging"],
    &["fitness", "gym", "workout"],
    &["cycling", "biking"],
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityInput {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub start_time: String,
    pub end_time: String,
    pub price: Option<f64>,
    pub max_participants: i64,
    pub image_url: Option<String>,
    pub requirements: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub price: Option<f64>,
    pub max_participants: Option<i64>,
    pub image_url: Option<String>,
    pub requirements: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    /// Derived time status: open | in_progress | completed.
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub requirements: Option<String>,
    pub image_url: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub max_participants: i64,
    pub current_participants: i64,
    pub status: String,
    pub creator_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListView {
    pub activities: Vec<ActivityView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

pub fn to_view(row: ActivitiesRow) -> ActivityView {
    ActivityView {
        id: row.activity_id,
        title: row.title,
        description: row.description,
        location: row.location,
        category: row.category,
        requirements: row.requirements,
        image_url: row.image_url,
        start_time: row.start_time,
        end_time: row.end_time,
        price: row.price,
        max_participants: row.max_participants,
        current_participants: row.current_participants,
        status: row.status,
        creator_id: row.creator_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub async fn create_activity(
    pool: &SqlitePool,
    input: CreateActivityInput,
    creator_id: &str,
) -> ServiceResult<ActivityView> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("title is required".to_string()));
    }
    if input.location.trim().is_empty() {
        return Err(ServiceError::Validation("location is required".to_string()));
    }
    if input.category.trim().is_empty() {
        return Err(ServiceError::Validation("category is required".to_string()));
    }
    if input.max_participants < 1 {
        return Err(ServiceError::Validation(
            "maxParticipants must be at least 1".to_string(),
        ));
    }
    let price = input.price.unwrap_or(0.0);
    if price < 0.0 {
        return Err(ServiceError::Validation("price cannot be negative".to_string()));
    }

    let start_time = parse_datetime(&input.start_time, "startTime")?;
    let end_time = parse_datetime(&input.end_time, "endTime")?;
    let now = timefmt::now();
    validate_window(&start_time, &end_time, &now)?;

    let activity_id = Uuid::new_v4().to_string();
    activity_repo::insert_activity(
        pool,
        activity_repo::NewActivity {
            activity_id: &activity_id,
            title,
            description: input.description.trim(),
            location: input.location.trim(),
            category: input.category.trim(),
            requirements: input.requirements.as_deref(),
            image_url: input.image_url.as_deref(),
            start_time: &start_time,
            end_time: &end_time,
            price,
            max_participants: input.max_participants,
            creator_id,
            created_at: &now,
        },
    )
    .await?;

    get_activity(pool, &activity_id).await
}

pub async fn get_activity(pool: &SqlitePool, activity_id: &str) -> ServiceResult<ActivityView> {
    let row = activity_repo::load_visible_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("activity not found".to_string()))?;
    Ok(to_view(row))
}

pub async fn update_activity(
    pool: &SqlitePool,
    activity_id: &str,
    input: UpdateActivityInput,
    requester_id: &str,
) -> ServiceResult<ActivityView> {
    let row = activity_repo::load_visible_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("activity not found".to_string()))?;

    if row.creator_id != requester_id {
        return Err(ServiceError::Forbidden(
            "only the creator can update this activity".to_string(),
        ));
    }

    let now = timefmt::now();
    let started = row.start_time <= now;
    if started && patches_restricted_fields(&input) {
        return Err(ServiceError::InvalidState(
            "activity has started; only description and image can be changed".to_string(),
        ));
    }

    let start_time = input
        .start_time
        .as_deref()
        .map(|s| parse_datetime(s, "startTime"))
        .transpose()?;
    let end_time = input
        .end_time
        .as_deref()
        .map(|s| parse_datetime(s, "endTime"))
        .transpose()?;
    if start_time.is_some() || end_time.is_some() {
        let effective_start = start_time.as_deref().unwrap_or(&row.start_time);
        let effective_end = end_time.as_deref().unwrap_or(&row.end_time);
        validate_window(effective_start, effective_end, &now)?;
    }

    if let Some(price) = input.price {
        if price < 0.0 {
            return Err(ServiceError::Validation("price cannot be negative".to_string()));
        }
    }
    if let Some(max) = input.max_participants {
        if max < 1 {
            return Err(ServiceError::Validation(
                "maxParticipants must be at least 1".to_string(),
            ));
        }
        if max < row.current_participants {
            return Err(ServiceError::InvalidState(
                "maxParticipants cannot drop below the current participant count".to_string(),
            ));
        }
    }
    if let Some(status) = input.status.as_deref() {
        if !matches!(status, "active" | "cancelled" | "completed") {
            return Err(ServiceError::Validation(
                "status must be active, cancelled or completed".to_string(),
            ));
        }
    }

    activity_repo::update_activity(
        pool,
        activity_id,
        ActivityPatch {
            title: input.title.as_deref().map(str::trim),
            description: input.description.as_deref(),
            location: input.location.as_deref().map(str::trim),
            category: input.category.as_deref().map(str::trim),
            requirements: input.requirements.as_deref(),
            image_url: input.image_url.as_deref(),
            start_time: start_time.as_deref(),
            end_time: end_time.as_deref(),
            price: input.price,
            max_participants: input.max_participants,
            status: input.status.as_deref(),
        },
        &now,
    )
    .await?;

    get_activity(pool, activity_id).await
}

pub async fn delete_activity(
    pool: &SqlitePool,
    activity_id: &str,
    requester_id: &str,
) -> ServiceResult<()> {
    let row = activity_repo::load_visible_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("activity not found".to_string()))?;
    if row.creator_id != requester_id {
        return Err(ServiceError::Forbidden(
            "only the creator can delete this activity".to_string(),
        ));
    }
    activity_repo::soft_delete(pool, activity_id, &timefmt::now()).await?;
    Ok(())
}

pub async fn list_activities(
    pool: &SqlitePool,
    query: &ActivityListQuery,
) -> ServiceResult<ActivityListView> {
    let (page, limit) = clamp_page(query.page, query.limit);
    let filter = build_filter(query);

    let rows = activity_repo::list_filtered(pool, &filter, limit, (page - 1) * limit).await?;
    let total = activity_repo::count_filtered(pool, &filter).await?;

    Ok(ActivityListView {
        activities: rows.into_iter().map(to_view).collect(),
        total,
        page,
        limit,
    })
}

pub async fn list_user_activities(
    pool: &SqlitePool,
    user_id: &str,
) -> ServiceResult<Vec<ActivityView>> {
    let rows = activity_repo::list_by_creator(pool, user_id).await?;
    Ok(rows.into_iter().map(to_view).collect())
}

/// Capacity mutation primitive: the delta is applied only if the counter stays
/// within `[0, max_participants]`, in one conditional statement.
pub async fn adjust_participants(
    pool: &SqlitePool,
    activity_id: &str,
    delta: i64,
) -> ServiceResult<i64> {
    let changed =
        activity_repo::try_adjust_participants(pool, activity_id, delta, &timefmt::now()).await?;
    if changed == 0 {
        activity_repo::load_visible_by_id(pool, activity_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("activity not found".to_string()))?;
        let msg = if delta > 0 {
            "activity is full"
        } else {
            "participant count cannot go negative"
        };
        return Err(ServiceError::Capacity(msg.to_string()));
    }
    let row = activity_repo::load_visible_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("activity not found".to_string()))?;
    Ok(row.current_participants)
}

fn build_filter(query: &ActivityListQuery) -> ActivityFilter {
    let q_like = match query.search.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => format!("%{}%", s.to_lowercase()),
        _ => String::new(),
    };
    let categories = match query.category.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => expand_category(c),
        _ => Vec::new(),
    };
    let time_status = normalize_time_status(query.status.as_deref());
    let start_date = query
        .start_date
        .as_deref()
        .and_then(timefmt::parse)
        .unwrap_or_default();
    let end_date = query
        .end_date
        .as_deref()
        .and_then(timefmt::parse)
        .unwrap_or_default();

    ActivityFilter {
        q_like,
        categories,
        time_status,
        start_date,
        end_date,
    }
}

// A search for any member of a synonym set matches every member, so
// "soccer" finds activities filed under "football" and vice versa.
fn expand_category(category: &str) -> Vec<String> {
    let needle = category.to_lowercase();
    for set in CATEGORY_SYNONYMS {
        if set.iter().any(|alias| *alias == needle) {
            return set.iter().map(|s| s.to_string()).collect();
        }
    }
    vec![needle]
}

// Unknown status values fall through to "no filter", matching how the
// search endpoint has always behaved.
fn normalize_time_status(status: Option<&str>) -> String {
    match status.map(str::trim) {
        Some("open") | Some("registration_open") => "open".to_string(),
        Some("in_progress") => "in_progress".to_string(),
        Some("completed") => "completed".to_string(),
        _ => String::new(),
    }
}

fn clamp_page(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

fn parse_datetime(input: &str, field: &str) -> ServiceResult<String> {
    timefmt::parse(input)
        .ok_or_else(|| ServiceError::Validation(format!("{field} is not a valid datetime")))
}

fn validate_window(start: &str, end: &str, now: &str) -> ServiceResult<()> {
    if start >= end {
        return Err(ServiceError::Validation(
            "startTime must be before endTime".to_string(),
        ));
    }
    if start <= now {
        return Err(ServiceError::Validation(
            "startTime must be in the future".to_string(),
        ));
    }
    Ok(())
}

fn patches_restricted_fields(input: &UpdateActivityInput) -> bool {
    input.title.is_some()
        || input.location.is_some()
        || input.category.is_some()
        || input.start_time.is_some()
        || input.end_time.is_some()
        || input.price.is_some()
        || input.max_participants.is_some()
        || input.requirements.is_some()
        || input.status.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_expansion_is_bidirectional() {
        assert_eq!(expand_category("football"), vec!["football", "soccer"]);
        assert_eq!(expand_category("soccer"), vec!["football", "soccer"]);
        assert_eq!(expand_category("Ping Pong"), vec!["table tennis", "ping pong"]);
    }

    #[test]
    fn category_expansion_passes_unknown_through() {
        assert_eq!(expand_category("chess"), vec!["chess"]);
    }

    #[test]
    fn page_clamping() {
        assert_eq!(clamp_page(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(clamp_page(Some(0), Some(0)), (1, 1));
        assert_eq!(clamp_page(Some(3), Some(500)), (3, MAX_PAGE_SIZE));
        assert_eq!(clamp_page(Some(-2), Some(25)), (1, 25));
    }

    #[test]
    fn unknown_status_means_no_filter() {
        assert_eq!(normalize_time_status(Some("archived")), "");
        assert_eq!(normalize_time_status(Some("open")), "open");
        assert_eq!(normalize_time_status(Some("registration_open")), "open");
        assert_eq!(normalize_time_status(None), "");
    }

    #[test]
    fn restricted_field_detection() {
        let desc_only = UpdateActivityInput {
            description: Some("new text".to_string()),
            image_url: Some("img.png".to_string()),
            ..Default::default()
        };
        assert!(!patches_restricted_fields(&desc_only));

        let with_price = UpdateActivityInput {
            price: Some(10.0),
            ..Default::default()
        };
        assert!(patches_restricted_fields(&with_price));
    }
}
