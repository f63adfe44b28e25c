//! REST API endpoints.
//!
//! Axum-based HTTP API over the player list, player pages and stat
//! recomputes.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::stats::StatsError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::NotFound(what) => ApiError::NotFound(what),
            other => {
                error!("Request failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/players", get(routes::players::list_players))
        .route("/api/players/:id", get(routes::players::get_player_page))
        .route("/api/players/:id/stats", post(routes::players::update_player_stats))
        .route("/api/players/:id/page", delete(routes::players::invalidate_player_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured origin; `*` allows any.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }

    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
            layer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[tokio::test]
    async fn test_not_found_response() {
        let err = ApiError::from(StatsError::NotFound("player ghost".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["error"]["message"], "Not found: player ghost");
    }

    #[test]
    fn test_storage_failure_is_internal() {
        let err: ApiError = StatsError::from(StorageError::Unavailable("down".to_string())).into();
        assert!(matches!(err, ApiError::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
