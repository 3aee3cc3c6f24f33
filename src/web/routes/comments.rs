use axum::{
    extract::{Path, Query, State},
    response::Response,
    Extension,
};
use serde::Deserialize;

use crate::services::comment_service;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{ok, ok_empty, ok_with_message, ApiError, ApiJson, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentForm {
    pub activity_id: String,
    pub content: String,
    pub rating: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiJson(form): ApiJson<CreateCommentForm>,
) -> Result<Response, ApiError> {
    let comment = comment_service::create_comment(
        &state.pool,
        &auth.id,
        &form.activity_id,
        &form.content,
        form.rating,
    )
    .await?;
    Ok(ok_with_message("comment posted", comment))
}

pub async fn activity_comments_handler(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let page = comment_service::list_activity_comments(
        &state.pool,
        &activity_id,
        query.page,
        query.limit,
    )
    .await?;
    Ok(ok(page))
}

pub async fn rating_stats_handler(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
) -> Result<Response, ApiError> {
    let stats = comment_service::rating_stats(&state.pool, &activity_id).await?;
    Ok(ok(stats))
}

pub async fn my_comments_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Response, ApiError> {
    let comments = comment_service::list_user_comments(&state.pool, &auth.id).await?;
    Ok(ok(comments))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(comment_id): Path<String>,
) -> Result<Response, ApiError> {
    comment_service::delete_comment(&state.pool, &comment_id, &auth.id).await?;
    Ok(ok_empty("comment deleted"))
}
