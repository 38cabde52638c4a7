use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::{ErrorKind, VerifierError};
use crate::types::verification::VerificationResponse;

/// Failure of a `POST /verify` request.
///
/// Rendered with the same body as a successful verification, with
/// `verified_status` set to `mismatch`. The status code carries the category:
/// * `InvalidBody` and input validation errors - 400 Bad Request
/// * Unknown address code or chain - 404 Not Found
/// * Chain or indexer fetch errors - 502 Bad Gateway
/// * Compiler download and compilation errors - 500 Internal Server Error
#[derive(Debug, thiserror::Error)]
pub enum VerifyRouteError {
    /// The body could not be decoded as a verification request
    #[error("{0}")]
    InvalidBody(String),

    #[error(transparent)]
    Verification(#[from] VerifierError),
}

impl VerifyRouteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            VerifyRouteError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            VerifyRouteError::Verification(e) => match e.kind() {
                ErrorKind::InputValidation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::FetchFailure => StatusCode::BAD_GATEWAY,
                ErrorKind::CompilerUnavailable | ErrorKind::CompileFailure | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for VerifyRouteError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(VerificationResponse::failure(self.to_string()))).into_response()
    }
}
