//! Maps [`OverlayError`] onto HTTP status codes.
//!
//! Reference: SPEC_FULL.md §6 "Errors from route handlers are mapped to
//! HTTP status codes via a small `IntoResponse` adapter", grounded on
//! `panon-btc-cory/crates/cory/src/server/error.rs`'s `AppError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use overlay_core::OverlayError;

pub struct AppError(pub OverlayError);

impl From<OverlayError> for AppError {
    fn from(err: OverlayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            OverlayError::UnknownTopic(_) | OverlayError::SpvInvalid { .. } => StatusCode::BAD_REQUEST,
            OverlayError::UnknownService(_) | OverlayError::NoMatchingOutputs(_) => StatusCode::NOT_FOUND,
            OverlayError::HistoryRehydrationFailed(_)
            | OverlayError::StalePruneFailed(_)
            | OverlayError::Service(_)
            | OverlayError::Storage(_)
            | OverlayError::Codec(_)
            | OverlayError::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
