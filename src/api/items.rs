//! Item-level operations: usage dice, supply and armour

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{ApiResult, AppState};
use crate::model::ArmourValue;
use crate::resolution::UsageDieResult;

/// Build the item router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items/{id}/usage-die", post(roll_usage_die))
        .route("/items/{id}/usage-die/reset", post(reset_usage_die))
        .route("/items/{id}/quantity", post(adjust_quantity))
        .route("/items/{id}/armour/break", post(break_armour))
        .route("/items/{id}/armour/repair", post(repair_armour))
}

#[derive(Debug, Deserialize)]
struct QuantityRequest {
    /// Units to add; negative to spend
    delta: i32,
}

#[derive(Debug, Serialize)]
struct QuantityResponse {
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    /// False when the die was already at its maximum
    reset: bool,
}

/// POST /items/{id}/usage-die
async fn roll_usage_die(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UsageDieResult> {
    Ok(Json(state.resolver.resolve_usage_die(&id).await?))
}

/// POST /items/{id}/usage-die/reset
async fn reset_usage_die(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ResetResponse> {
    let reset = state.resolver.reset_usage_die(&id).await?;
    Ok(Json(ResetResponse { reset }))
}

/// POST /items/{id}/quantity
async fn adjust_quantity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<QuantityRequest>,
) -> ApiResult<QuantityResponse> {
    let quantity = state.resolver.adjust_quantity(&id, req.delta).await?;
    Ok(Json(QuantityResponse { quantity }))
}

async fn break_armour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ArmourValue> {
    Ok(Json(state.resolver.break_armour_die(&id).await?))
}

async fn repair_armour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ArmourValue> {
    Ok(Json(state.resolver.repair_armour_die(&id).await?))
}
