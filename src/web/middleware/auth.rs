use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::database::user_repo;
use crate::services::credential_service;
use crate::web::{ApiResponse, AppState};

/// Injected into request extensions for every authenticated request.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub username: String,
    pub role: String,
}

// The only place bearer tokens are checked: extract, verify signature and
// expiry, confirm the account is still active, then hand the identity to the
// handler via extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok())
        .unwrap_or("");

    let Some(token) = credential_service::bearer_token(auth_header) else {
        return unauthorized("missing bearer token");
    };

    let claims = match credential_service::verify_token(&state.jwt_secret, token) {
        Ok(claims) => claims,
        Err(_) => return unauthorized("invalid or expired token"),
    };

    let user = match user_repo::load_active_by_id(&state.pool, &claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => return unauthorized("account not found or deactivated"),
        Err(e) => {
            tracing::error!("auth lookup failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()> {
                    success: false,
                    message: Some("internal server error".to_string()),
                    data: None,
                }),
            )
                .into_response();
        }
    };

    request.extensions_mut().insert(AuthenticatedUser {
        id: user.user_id,
        username: user.username,
        role: user.role,
    });
    next.run(request).await
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()> {
            success: false,
            message: Some(message.to_string()),
            data: None,
        }),
    )
        .into_response()
}
