pub mod middleware;
pub mod routes;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::services::error::ServiceError;
use crate::web::routes::{activities, comments, orders, registrations, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt_secret: String,
}

/// The uniform response envelope. Business failures (including service-level
/// validation) ride a 200 with `success: false`; transport-level codes are
/// reserved for auth (401), malformed request bodies (422) and store
/// failures (500).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    Json(ApiResponse {
        success: true,
        message: None,
        data: Some(data),
    })
    .into_response()
}

pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> Response {
    Json(ApiResponse {
        success: true,
        message: Some(message.to_string()),
        data: Some(data),
    })
    .into_response()
}

pub fn ok_empty(message: &str) -> Response {
    Json(ApiResponse::<()> {
        success: true,
        message: Some(message.to_string()),
        data: None,
    })
    .into_response()
}

fn fail(message: String) -> ApiResponse<()> {
    ApiResponse {
        success: false,
        message: Some(message),
        data: None,
    }
}

/// Renders a `ServiceError` into the envelope, so handlers can end with `?`.
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ServiceError::Database(e) => {
                tracing::error!("database failure: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(fail("internal server error".to_string())),
                )
                    .into_response()
            }
            ServiceError::Internal(msg) => {
                tracing::error!("internal failure: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(fail("internal server error".to_string())),
                )
                    .into_response()
            }
            other => Json(fail(other.to_string())).into_response(),
        }
    }
}

/// Like `Json`, but renders extraction failures as a 422 envelope instead of
/// axum's plain-text rejection.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(fail(rejection.body_text())),
            )
                .into_response()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/users/profile", get(users::profile_handler))
        .route("/api/users/:id", put(users::update_user_handler))
        .route("/api/users/:id/deactivate", post(users::deactivate_handler))
        .route("/api/activities", post(activities::create_activity_handler))
        .route(
            "/api/activities/:id",
            put(activities::update_activity_handler).delete(activities::delete_activity_handler),
        )
        .route("/api/activities/my/created", get(activities::my_activities_handler))
        .route(
            "/api/activities/:id/registrations",
            get(registrations::activity_registrations_handler),
        )
        .route("/api/registrations", post(registrations::join_handler))
        .route(
            "/api/registrations/activity/:activity_id",
            delete(registrations::cancel_handler),
        )
        .route("/api/registrations/my", get(registrations::my_registrations_handler))
        .route(
            "/api/registrations/check/:activity_id",
            get(registrations::check_handler),
        )
        .route("/api/orders", post(orders::create_order_handler))
        .route("/api/orders/my", get(orders::my_orders_handler))
        .route("/api/orders/stats/my", get(orders::order_stats_handler))
        .route("/api/orders/:order_number", get(orders::get_order_handler))
        .route("/api/orders/:order_number/pay", put(orders::pay_order_handler))
        .route("/api/orders/:order_number/cancel", put(orders::cancel_order_handler))
        .route("/api/orders/:order_number/refund", put(orders::refund_order_handler))
        .route("/api/comments", post(comments::create_comment_handler))
        .route("/api/comments/my", get(comments::my_comments_handler))
        .route("/api/comments/:comment_id", delete(comments::delete_comment_handler))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let public = Router::new()
        .route("/api/users/register", post(users::register_handler))
        .route("/api/users/login", post(users::login_handler))
        .route("/api/users/:id", get(users::get_user_handler))
        .route("/api/activities", get(activities::list_activities_handler))
        .route("/api/activities/:id", get(activities::get_activity_handler))
        .route(
            "/api/comments/activity/:activity_id",
            get(comments::activity_comments_handler),
        )
        .route(
            "/api/comments/stats/:activity_id",
            get(comments::rating_stats_handler),
        );

    Router::new().merge(protected).merge(public).with_state(state)
}
