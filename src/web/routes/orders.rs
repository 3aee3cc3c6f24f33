use axum::{
    extract::{Path, Query, State},
    response::Response,
    Extension,
};
use serde::Deserialize;

use crate::services::order_service;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{ok, ok_with_message, ApiError, ApiJson, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderForm {
    pub activity_id: String,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

pub async fn create_order_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiJson(form): ApiJson<CreateOrderForm>,
) -> Result<Response, ApiError> {
    let order = order_service::create_order(
        &state.pool,
        &auth.id,
        &form.activity_id,
        form.notes.as_deref(),
    )
    .await?;
    Ok(ok_with_message("order created", order))
}

pub async fn my_orders_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<OrderListQuery>,
) -> Result<Response, ApiError> {
    let orders =
        order_service::list_user_orders(&state.pool, &auth.id, query.status.as_deref()).await?;
    Ok(ok(orders))
}

pub async fn order_stats_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Response, ApiError> {
    let stats = order_service::order_stats(&state.pool, &auth.id).await?;
    Ok(ok(stats))
}

pub async fn get_order_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(order_number): Path<String>,
) -> Result<Response, ApiError> {
    let order = order_service::get_order(&state.pool, &order_number, &auth.id).await?;
    Ok(ok(order))
}

pub async fn pay_order_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(order_number): Path<String>,
) -> Result<Response, ApiError> {
    let order = order_service::pay_order(&state.pool, &order_number, &auth.id).await?;
    Ok(ok_with_message("order paid", order))
}

pub async fn cancel_order_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(order_number): Path<String>,
) -> Result<Response, ApiError> {
    let order = order_service::cancel_order(&state.pool, &order_number, &auth.id).await?;
    Ok(ok_with_message("order cancelled", order))
}

pub async fn refund_order_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(order_number): Path<String>,
) -> Result<Response, ApiError> {
    let order = order_service::refund_order(&state.pool, &order_number, &auth.id).await?;
    Ok(ok_with_message("order refunded", order))
}
