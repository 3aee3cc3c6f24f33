use axum::{
    extract::{Path, State},
    response::Response,
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::services::registration_service;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{ok, ok_empty, ok_with_message, ApiError, ApiJson, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinForm {
    pub activity_id: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCheckView {
    pub registered: bool,
}

pub async fn join_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiJson(form): ApiJson<JoinForm>,
) -> Result<Response, ApiError> {
    let registration = registration_service::join_activity(
        &state.pool,
        &auth.id,
        &form.activity_id,
        form.notes.as_deref(),
    )
    .await?;
    Ok(ok_with_message("registration successful", registration))
}

pub async fn cancel_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
) -> Result<Response, ApiError> {
    registration_service::cancel_registration(&state.pool, &auth.id, &activity_id).await?;
    Ok(ok_empty("registration cancelled"))
}

pub async fn my_registrations_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Response, ApiError> {
    let registrations =
        registration_service::list_user_registrations(&state.pool, &auth.id).await?;
    Ok(ok(registrations))
}

pub async fn activity_registrations_handler(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
) -> Result<Response, ApiError> {
    let registrants =
        registration_service::list_activity_registrations(&state.pool, &activity_id).await?;
    Ok(ok(registrants))
}

pub async fn check_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
) -> Result<Response, ApiError> {
    let registered =
        registration_service::is_registered(&state.pool, &auth.id, &activity_id).await?;
    Ok(ok(RegistrationCheckView { registered }))
}
