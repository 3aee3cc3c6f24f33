use axum::{
    extract::{Path, State},
    response::Response,
    Extension,
};
use serde::Deserialize;

use crate::services::user_service::{self, RegisterUserInput, UpdateUserInput};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{ok, ok_empty, ok_with_message, ApiError, ApiJson, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterUserInput>,
) -> Result<Response, ApiError> {
    let user = user_service::register_user(&state.pool, input).await?;
    Ok(ok_with_message("registration successful", user))
}

pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<Response, ApiError> {
    let view =
        user_service::login(&state.pool, &state.jwt_secret, &form.username, &form.password).await?;
    Ok(ok_with_message("login successful", view))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    let user = user_service::get_user(&state.pool, &user_id).await?;
    Ok(ok(user))
}

pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Response, ApiError> {
    let user = user_service::get_user(&state.pool, &auth.id).await?;
    Ok(ok(user))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> Result<Response, ApiError> {
    let user =
        user_service::update_user(&state.pool, &user_id, input, &auth.id, &auth.role).await?;
    Ok(ok_with_message("profile updated", user))
}

pub async fn deactivate_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    user_service::deactivate_user(&state.pool, &user_id, &auth.id, &auth.role).await?;
    Ok(ok_empty("account deactivated"))
}
