//! Error handling

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, info, warn};

use crate::gallery::GalleryError;
use crate::generator::GenerateError;

/// Errors the genstudio web layer reports to callers.
#[derive(Debug)]
pub enum StudioError {
    /// When the client sent something we can't use
    BadRequest(String),
    /// When the server is missing configuration, eg the API key
    Misconfigured(String),
    /// When the generation API failed or returned nothing usable
    Upstream(String),
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl StudioError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Misconfigured(_) | Self::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(message) | Self::Upstream(message) => message.clone(),
            Self::Misconfigured(message) => format!("Server misconfiguration: {message}"),
            Self::NotFound(_) => "Not found".to_string(),
            Self::InternalServerError(message) => format!("Internal error: {message}"),
        }
    }
}

impl std::fmt::Display for StudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for StudioError {}

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        StudioError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for StudioError {
    fn from(err: axum::http::Error) -> Self {
        StudioError::InternalServerError(err.to_string())
    }
}

impl From<GalleryError> for StudioError {
    fn from(err: GalleryError) -> Self {
        match err {
            GalleryError::MissingPayload
            | GalleryError::InvalidEncoding(_)
            | GalleryError::InvalidDimensions { .. } => StudioError::BadRequest(err.to_string()),
            GalleryError::InvalidFilename(name) => StudioError::NotFound(name),
            GalleryError::Io(_) => StudioError::InternalServerError(err.to_string()),
        }
    }
}

impl From<GenerateError> for StudioError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::MissingApiKey | GenerateError::Endpoint(_) => {
                StudioError::Misconfigured(err.to_string())
            }
            GenerateError::Request(_)
            | GenerateError::Status { .. }
            | GenerateError::Decode(_)
            | GenerateError::NoImage => StudioError::Upstream(err.to_string()),
        }
    }
}

impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            StudioError::BadRequest(message) => info!("Bad request: {message}"),
            StudioError::NotFound(path) => info!("404 {path}"),
            StudioError::Upstream(message) => warn!("Upstream failure: {message}"),
            StudioError::Misconfigured(message) => error!("Misconfiguration: {message}"),
            StudioError::InternalServerError(message) => {
                error!("Internal server error: {message}")
            }
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
