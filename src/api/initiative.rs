//! Combat lifecycle, the initiative bag and the outbound message queue

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ApiResult, AppState};
use crate::host::HostMessage;
use crate::initiative::{DrawOutcome, RoundSnapshot, Token};
use crate::model::Combatant;

/// Build the combat and initiative router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/combat", post(start_combat).delete(end_combat))
        .route("/initiative", get(snapshot))
        .route("/initiative/shuffle", post(shuffle))
        .route("/initiative/draw", post(draw))
        .route("/messages", get(drain_messages))
}

#[derive(Debug, Deserialize)]
struct StartCombatRequest {
    combatants: Vec<Combatant>,
}

#[derive(Debug, Serialize)]
struct ShuffleResponse {
    bag: Vec<Token>,
}

/// POST /combat
/// Start a combat, replacing any active one
async fn start_combat(
    State(state): State<AppState>,
    Json(req): Json<StartCombatRequest>,
) -> impl IntoResponse {
    let combat = state.host.start_combat(req.combatants).await;
    info!("combat {} started", combat.id);
    (StatusCode::CREATED, Json(combat))
}

/// DELETE /combat
async fn end_combat(State(state): State<AppState>) -> StatusCode {
    if !state.host.end_combat().await {
        debug!("no combat to end");
    }
    StatusCode::NO_CONTENT
}

/// GET /initiative
async fn snapshot(State(state): State<AppState>) -> ApiResult<RoundSnapshot> {
    Ok(Json(state.initiative.snapshot().await?))
}

/// POST /initiative/shuffle
async fn shuffle(State(state): State<AppState>) -> ApiResult<ShuffleResponse> {
    let bag = state.initiative.build_bag().await?;
    Ok(Json(ShuffleResponse { bag }))
}

/// POST /initiative/draw
async fn draw(State(state): State<AppState>) -> ApiResult<DrawOutcome> {
    Ok(Json(state.initiative.draw().await?))
}

/// GET /messages
/// Drain chat cards and notices queued since the last call
async fn drain_messages(State(state): State<AppState>) -> Json<Vec<HostMessage>> {
    Json(state.messages.drain().await)
}
