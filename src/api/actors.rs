//! Actor sheets and actor-level rolls

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiResult, AppState};
use crate::error::RulesError;
use crate::host::ActorStore;
use crate::model::{Actor, Attribute, Attributes, HitPoints};
use crate::resolution::{DamageDescriptor, DamageResult, RollModifiers, RollResult};

/// Build the actor router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/actors", put(put_actor))
        .route("/actors/{id}", get(get_actor))
        .route("/actors/{id}/attack", post(attack))
        .route("/actors/{id}/test", post(attribute_test))
        .route("/damage", post(damage))
        .route("/actors/{id}/usage-dice/reset", post(reset_usage_dice))
        .route("/actors/{id}/armour/repair", post(repair_armour))
        .route("/actors/{id}/rest/short", post(short_rest))
        .route("/actors/{id}/rest/long", post(long_rest))
        .route("/actors/{id}/attributes/roll", post(roll_attributes))
}

/// Attack request: the weapon plus roll options
#[derive(Debug, Deserialize)]
struct AttackRequest {
    weapon_id: String,
    #[serde(flatten)]
    modifiers: RollModifiers,
}

/// Attribute test request
#[derive(Debug, Deserialize)]
struct TestRequest {
    attribute: Attribute,
    #[serde(flatten)]
    modifiers: RollModifiers,
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: usize,
}

/// PUT /actors
/// Load or replace an actor sheet
async fn put_actor(State(state): State<AppState>, Json(actor): Json<Actor>) -> ApiResult<Actor> {
    debug!("storing actor {} ({})", actor.id, actor.name);
    state.host.put_actor(actor.clone()).await;
    Ok(Json(actor))
}

/// GET /actors/{id}
async fn get_actor(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Actor> {
    let actor = state
        .host
        .get_actor(&id)
        .await
        .map_err(RulesError::from)?
        .ok_or_else(|| RulesError::not_found("actor", &id))?;
    Ok(Json(actor))
}

/// POST /actors/{id}/attack
async fn attack(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AttackRequest>,
) -> ApiResult<RollResult> {
    let result = state
        .resolver
        .resolve_attack(&id, &req.weapon_id, req.modifiers)
        .await?;
    Ok(Json(result))
}

/// POST /actors/{id}/test
async fn attribute_test(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TestRequest>,
) -> ApiResult<RollResult> {
    let result = state
        .resolver
        .resolve_attribute_test(&id, req.attribute, req.modifiers)
        .await?;
    Ok(Json(result))
}

/// POST /damage
/// Roll the damage descriptor attached to an attack result
async fn damage(
    State(state): State<AppState>,
    Json(descriptor): Json<DamageDescriptor>,
) -> ApiResult<DamageResult> {
    Ok(Json(state.resolver.resolve_damage(&descriptor).await?))
}

async fn reset_usage_dice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CountResponse> {
    let count = state.resolver.reset_all_usage_dice(&id).await?;
    Ok(Json(CountResponse { count }))
}

async fn repair_armour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CountResponse> {
    let count = state.resolver.repair_all_armour(&id).await?;
    Ok(Json(CountResponse { count }))
}

async fn short_rest(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<HitPoints> {
    Ok(Json(state.resolver.short_rest(&id).await?))
}

async fn long_rest(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<HitPoints> {
    Ok(Json(state.resolver.long_rest(&id).await?))
}

async fn roll_attributes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Attributes> {
    Ok(Json(state.resolver.roll_attributes(&id).await?))
}
