use axum::{
    extract::{Path, Query, State},
    response::Response,
    Extension,
};

use crate::services::activity_service::{
    self, ActivityListQuery, CreateActivityInput, UpdateActivityInput,
};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{ok, ok_empty, ok_with_message, ApiError, ApiJson, AppState};

pub async fn create_activity_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiJson(input): ApiJson<CreateActivityInput>,
) -> Result<Response, ApiError> {
    let activity = activity_service::create_activity(&state.pool, input, &auth.id).await?;
    Ok(ok_with_message("activity created", activity))
}

pub async fn list_activities_handler(
    State(state): State<AppState>,
    Query(query): Query<ActivityListQuery>,
) -> Result<Response, ApiError> {
    let page = activity_service::list_activities(&state.pool, &query).await?;
    Ok(ok(page))
}

pub async fn get_activity_handler(
    State(state): State<AppState>,
    Path(activity_id): Path<String>,
) -> Result<Response, ApiError> {
    let activity = activity_service::get_activity(&state.pool, &activity_id).await?;
    Ok(ok(activity))
}

pub async fn update_activity_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    ApiJson(input): ApiJson<UpdateActivityInput>,
) -> Result<Response, ApiError> {
    let activity =
        activity_service::update_activity(&state.pool, &activity_id, input, &auth.id).await?;
    Ok(ok_with_message("activity updated", activity))
}

pub async fn delete_activity_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
) -> Result<Response, ApiError> {
    activity_service::delete_activity(&state.pool, &activity_id, &auth.id).await?;
    Ok(ok_empty("activity deleted"))
}

pub async fn my_activities_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Response, ApiError> {
    let activities = activity_service::list_user_activities(&state.pool, &auth.id).await?;
    Ok(ok(activities))
}
