use axum::response::Response;
use serde::{Deserialize, Serialize};

use super::error::VerifyRouteError;

/// Body of the responses that are not verification results.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    pub fn error(message: String) -> Self {
        Self { success: false, message: Some(message) }
    }
}

pub type VerifyRouteResult = Result<Response<axum::body::Body>, VerifyRouteError>;
