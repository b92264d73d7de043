use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use eco_core::{Order, OrderRequest, OrderResponse};
use eco_order::OrderError;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// POST /orders
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let response = state
        .orders
        .create_order(req)
        .await
        .inspect_err(|e| record_failure(&state, e))?;

    state.metrics.orders_created.inc();
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get_order_by_id(&order_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Order with id {} not found", order_id)))?;

    Ok(Json(order))
}

/// PUT /orders/{id}/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let response = state
        .orders
        .update_order_status(&order_id, &req.status)
        .await
        .inspect_err(|e| record_failure(&state, e))?;

    state.metrics.status_updates.inc();
    Ok(Json(response))
}

fn record_failure(state: &AppState, err: &OrderError) {
    if matches!(
        err,
        OrderError::Validation(_) | OrderError::InvalidProductIds(_) | OrderError::UnknownStatus(_)
    ) {
        state.metrics.validation_failures.inc();
    }
}
