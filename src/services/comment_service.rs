use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::{activity_repo, comment_repo};
use crate::models::comments::ActivityCommentRow;
use crate::services::error::{is_unique_violation, ServiceError, ServiceResult};
use crate::services::timefmt;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub user_id: String,
    pub activity_id: String,
    pub content: String,
    pub rating: Option<i64>,
    pub created_at: String,
    pub username: Option<String>,
    pub real_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListView {
    pub comments: Vec<CommentView>,
    pub total: i64,
    pub average_rating: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingStatsView {
    pub average_rating: f64,
    pub total_comments: i64,
    /// Keys "1" through "5".
    pub rating_distribution: BTreeMap<u8, i64>,
}

fn to_view(row: ActivityCommentRow) -> CommentView {
    CommentView {
        id: row.comment_id,
        user_id: row.user_id,
        activity_id: row.activity_id,
        content: row.content,
        rating: row.rating,
        created_at: row.created_at,
        username: row.username,
        real_name: row.real_name,
    }
}

pub async fn create_comment(
    pool: &SqlitePool,
    user_id: &str,
    activity_id: &str,
    content: &str,
    rating: Option<i64>,
) -> ServiceResult<CommentView> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ServiceError::Validation("content is required".to_string()));
    }
    if let Some(rating) = rating {
        if !(1..=5).contains(&rating) {
            return Err(ServiceError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
    }

    activity_repo::load_visible_by_id(pool, activity_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("activity not found".to_string()))?;

    let comment_id = Uuid::new_v4().to_string();
    let inserted = comment_repo::insert_comment(
        pool,
        comment_repo::NewComment {
            comment_id: &comment_id,
            user_id,
            activity_id,
            content,
            rating,
            created_at: &timefmt::now(),
        },
    )
    .await;

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(ServiceError::Duplicate(
                "you have already commented on this activity".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let row = comment_repo::load_by_id(pool, &comment_id)
        .await?
        .ok_or_else(|| ServiceError::Internal("comment vanished after insert".to_string()))?;
    Ok(CommentView {
        id: row.comment_id,
        user_id: row.user_id,
        activity_id: row.activity_id,
        content: row.content,
        rating: row.rating,
        created_at: row.created_at,
        username: None,
        real_name: None,
    })
}

pub async fn list_activity_comments(
    pool: &SqlitePool,
    activity_id: &str,
    page: Option<i64>,
    limit: Option<i64>,
) -> ServiceResult<CommentListView> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    let rows = comment_repo::list_for_activity(pool, activity_id, limit, (page - 1) * limit).await?;
    let total = comment_repo::count_for_activity(pool, activity_id).await?;
    let average = comment_repo::average_rating(pool, activity_id).await?;

    Ok(CommentListView {
        comments: rows.into_iter().map(to_view).collect(),
        total,
        average_rating: round_one_decimal(average.unwrap_or(0.0)),
    })
}

pub async fn rating_stats(pool: &SqlitePool, activity_id: &str) -> ServiceResult<RatingStatsView> {
    let total = comment_repo::count_for_activity(pool, activity_id).await?;
    let average = comment_repo::average_rating(pool, activity_id).await?;
    let counts = comment_repo::rating_counts(pool, activity_id).await?;

    let mut distribution: BTreeMap<u8, i64> = (1..=5).map(|r| (r, 0)).collect();
    for row in counts {
        if (1..=5).contains(&row.rating) {
            distribution.insert(row.rating as u8, row.rating_count);
        }
    }

    Ok(RatingStatsView {
        average_rating: round_one_decimal(average.unwrap_or(0.0)),
        total_comments: total,
        rating_distribution: distribution,
    })
}

pub async fn list_user_comments(
    pool: &SqlitePool,
    user_id: &str,
) -> ServiceResult<Vec<CommentView>> {
    let rows = comment_repo::list_for_user(pool, user_id).await?;
    Ok(rows.into_iter().map(to_view).collect())
}

pub async fn delete_comment(
    pool: &SqlitePool,
    comment_id: &str,
    user_id: &str,
) -> ServiceResult<()> {
    let row = comment_repo::load_by_id(pool, comment_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("comment not found".to_string()))?;
    if row.user_id != user_id {
        return Err(ServiceError::Forbidden(
            "only the author can delete this comment".to_string(),
        ));
    }
    comment_repo::delete_by_id(pool, comment_id).await?;
    Ok(())
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
