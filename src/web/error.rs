//! HTTP errors rendered as HTML pages.
//!
//! Form problems never come through here: they re-render the form with a
//! 200. This type covers bad query strings and failures the user cannot fix.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::core_state::CoreError;
use crate::crypto::CryptoError;
use crate::db::DatabaseError;
use crate::inference::InferenceError;
use crate::uploads::UploadError;
use crate::web::templates;

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found")]
    NotFound,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            WebError::NotFound => (
                StatusCode::NOT_FOUND,
                "The requested page does not exist.".to_string(),
            ),
            WebError::Internal(detail) => {
                tracing::error!(detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The server encountered an internal error and was unable to complete your request."
                        .to_string(),
                )
            }
        };

        (status, Html(templates::error_page(status, &message))).into_response()
    }
}

impl From<CoreError> for WebError {
    fn from(err: CoreError) -> Self {
        WebError::Internal(err.to_string())
    }
}

impl From<DatabaseError> for WebError {
    fn from(err: DatabaseError) -> Self {
        WebError::Internal(format!("database: {err}"))
    }
}

impl From<InferenceError> for WebError {
    fn from(err: InferenceError) -> Self {
        WebError::Internal(format!("inference: {err}"))
    }
}

impl From<CryptoError> for WebError {
    fn from(err: CryptoError) -> Self {
        WebError::Internal(format!("crypto: {err}"))
    }
}

impl From<UploadError> for WebError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::OutsideUploadDir(path) => {
                WebError::BadRequest(format!("Not an uploaded image: {path}"))
            }
            other => WebError::Internal(format!("upload: {other}")),
        }
    }
}

impl From<tokio::task::JoinError> for WebError {
    fn from(err: tokio::task::JoinError) -> Self {
        WebError::Internal(format!("worker task: {err}"))
    }
}
