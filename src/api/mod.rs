//! HTTP API module - JSON endpoints over the in-memory host

mod actors;
mod initiative;
mod items;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::RulesConfig;
use crate::dice::DiceSource;
use crate::error::RulesError;
use crate::host::{HostError, MemoryHost, MessageQueue};
use crate::initiative::InitiativeBag;
use crate::resolution::Resolver;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub host: Arc<MemoryHost>,
    pub messages: Arc<MessageQueue>,
    pub initiative: Arc<InitiativeBag>,
    pub resolver: Arc<Resolver>,
}

impl AppState {
    /// Wire the scheduler and the resolver to a fresh in-memory host
    pub fn new(rules: RulesConfig, dice: Arc<dyn DiceSource>) -> Self {
        let host = MemoryHost::shared();
        let messages = MessageQueue::shared();
        let rules = Arc::new(rules);

        let initiative = Arc::new(InitiativeBag::new(
            host.clone(),
            host.clone(),
            messages.clone(),
            rules.clone(),
        ));
        let resolver = Arc::new(Resolver::new(
            host.clone(),
            host.clone(),
            dice,
            messages.clone(),
            rules,
        ));

        Self {
            host,
            messages,
            initiative,
            resolver,
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .merge(actors::router())
        .merge(items::router())
        .merge(initiative::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "bh2e",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Error response
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// A rules error on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(RulesError);

impl From<RulesError> for ApiError {
    fn from(err: RulesError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            // nothing to act on; the request was a no-op
            RulesError::NoActiveSession => return StatusCode::NO_CONTENT.into_response(),
            RulesError::NotFound { .. } | RulesError::Host(HostError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            RulesError::PreconditionFailed(_) | RulesError::EmptyResource(_) => {
                StatusCode::CONFLICT
            }
            RulesError::Dice(_) => StatusCode::BAD_REQUEST,
            RulesError::Host(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DiceError;

    fn status_of(err: RulesError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(RulesError::not_found("actor", "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RulesError::PreconditionFailed("no".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(RulesError::EmptyResource("empty".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(RulesError::NoActiveSession), StatusCode::NO_CONTENT);
        assert_eq!(
            status_of(RulesError::Dice(DiceError::Empty)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RulesError::Host(HostError::NotFound {
                kind: "actor",
                id: "a1".into()
            })),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RulesError::Host(HostError::Storage("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
