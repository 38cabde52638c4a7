use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use public::local_route;
use verify::verify_router;

use super::types::ApiResponse;
use crate::core::config::Config;

pub(super) mod public;
pub(super) mod verify;

/// Fallback for every unmatched route.
pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("The requested resource was not found".to_string())))
}

pub(crate) fn server_router(config: Arc<Config>) -> Router {
    Router::new().merge(local_route()).merge(verify_router(config)).fallback(handler_404)
}
