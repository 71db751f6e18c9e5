use std::error::Error;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// JSON body shared by every non-list response: `{status, message}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBody {
    pub status: String,
    pub message: String,
}

impl StatusBody {
    pub fn ok(message: &str) -> Self {
        Self {
            status: "OK".to_string(),
            message: message.to_string(),
        }
    }
}

/// Every way a request can fail. Nothing past this type leaves a handler:
/// `IntoResponse` turns each variant into a status code and a [`StatusBody`].
#[derive(Debug)]
pub enum ApiError {
    InvalidPayload(String),
    NotFound(i64),
    Store(StoreError),
    Task(tokio::task::JoinError),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload(_) => "InvalidPayload",
            ApiError::NotFound(_) => "NotFound",
            ApiError::Store(_) => "StoreFailure",
            ApiError::Task(_) => "TaskFailure",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> StatusBody {
        StatusBody {
            status: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidPayload(message) => write!(f, "invalid payload: {}", message),
            ApiError::NotFound(id) => write!(f, "person {} not found", id),
            ApiError::Store(err) => write!(f, "{}", err),
            ApiError::Task(err) => write!(f, "store task failed: {}", err),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiError::Store(err) => Some(err),
            ApiError::Task(err) => Some(err),
            ApiError::InvalidPayload(_) | ApiError::NotFound(_) => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::Store(value)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(value: tokio::task::JoinError) -> Self {
        ApiError::Task(value)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{self}");
        } else {
            tracing::warn!(kind = self.kind(), "{self}");
        }
        (status, Json(self.body())).into_response()
    }
}
