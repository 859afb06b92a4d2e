//! Errors local to the HTTP-backed service clients, before they're folded
//! into [`overlay_core::OverlayError::Service`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ServiceError> for overlay_core::OverlayError {
    fn from(err: ServiceError) -> Self {
        overlay_core::OverlayError::Service(err.to_string())
    }
}
