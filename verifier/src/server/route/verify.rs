use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{info, instrument, warn};

use crate::core::config::Config;
use crate::server::error::VerifyRouteError;
use crate::server::types::VerifyRouteResult;
use crate::service::VerificationService;
use crate::types::verification::{VerificationRequest, VerificationResponse};

/// Metadata documents embed every source file of the contract.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Handles `POST /verify`.
///
/// # Returns
/// * `VerifyRouteResult` - 200 with the verification status, including
///   `mismatch`, or an error response whose status code names the failing step
#[instrument(skip_all, fields(request_id = %format!("{:016x}", rand::random::<u64>())))]
async fn handle_verify_request(
    State(config): State<Arc<Config>>,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> VerifyRouteResult {
    let Json(request) = payload.map_err(|e| VerifyRouteError::InvalidBody(e.body_text()))?;

    match VerificationService::verify(request, config).await {
        Ok(outcome) => {
            let response = VerificationResponse::from(outcome);
            info!(status = %response.verified_status, "Verification request served");
            Ok(Json(response).into_response())
        }
        Err(e) => {
            warn!(error = %e, kind = ?e.kind(), "Verification request failed");
            Err(VerifyRouteError::from(e))
        }
    }
}

pub(super) fn verify_router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/verify", post(handle_verify_request))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(config)
}
