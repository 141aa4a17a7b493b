use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use club_core::codes::DomainCode;
use club_core::error::CoreError;
use club_db::StorageError;
use club_remote::RemoteError;

use crate::response::Envelope;

/// Error of one orchestration step, classified exactly once where the step
/// ran.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The request deadline passed while the step was in flight.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The request was cancelled before or during the step.
    #[error("request cancelled")]
    Cancelled,
}

impl StepError {
    /// Canonical key of a duplicate-entry failure, if this is one.
    pub fn duplicate_field(&self) -> Option<&str> {
        match self {
            StepError::Storage(StorageError::DuplicateEntry { field, .. }) => Some(field),
            _ => None,
        }
    }
}

/// Terminal outcome of a failed operation, rendered as the response
/// envelope with `data: null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub status: StatusCode,
    pub code: Option<DomainCode>,
    pub message: String,
}

/// Convenience type alias for handler return values.
pub type OpResult<T> = Result<T, Failure>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl Failure {
    pub fn new(status: StatusCode, code: Option<DomainCode>, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, None, message)
    }

    pub fn forbidden(code: Option<DomainCode>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, None, message)
    }

    pub fn not_found(code: DomainCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, Some(code), message)
    }

    pub fn conflict(code: DomainCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, Some(code), message)
    }

    /// 500 with a sanitized message; the detail is logged here.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, None, INTERNAL_MESSAGE)
    }

    /// Relay a status reported by a remote service. Codes outside the
    /// HTTP range become 502.
    pub fn relayed(status: u16, message: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        Self::new(status, None, message)
    }
}

impl From<CoreError> for Failure {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Failure::bad_request(msg),
            CoreError::Unauthorized(msg) => Failure::unauthenticated(msg),
            CoreError::Forbidden(msg) => Failure::forbidden(None, msg),
        }
    }
}

impl From<StepError> for Failure {
    fn from(err: StepError) -> Self {
        match err {
            StepError::Storage(storage) => match storage {
                StorageError::Validation(msg) => Failure::bad_request(msg),
                dup @ StorageError::DuplicateEntry { .. } => {
                    Failure::new(StatusCode::CONFLICT, None, dup.to_string())
                }
                other => Failure::internal(other),
            },
            StepError::Remote(remote) => match remote {
                RemoteError::Unavailable(msg) => {
                    tracing::warn!(error = %msg, "Remote service unavailable");
                    Failure::new(StatusCode::SERVICE_UNAVAILABLE, None, "remote service unavailable")
                }
                RemoteError::Timeout => {
                    Failure::new(StatusCode::GATEWAY_TIMEOUT, None, "remote call timed out")
                }
                RemoteError::UnexpectedStatus(status) => {
                    Failure::relayed(status, format!("remote service returned {status}"))
                }
                RemoteError::UnexpectedError(msg) => {
                    tracing::error!(error = %msg, "Unexpected remote error");
                    Failure::new(StatusCode::BAD_GATEWAY, None, "unexpected remote error")
                }
            },
            StepError::DeadlineExceeded => {
                Failure::new(StatusCode::GATEWAY_TIMEOUT, None, "request deadline exceeded")
            }
            StepError::Cancelled => {
                Failure::new(StatusCode::INTERNAL_SERVER_ERROR, None, "request cancelled")
            }
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            status: self.status.as_u16(),
            code: self.code.map(DomainCode::value),
            message: self.message,
            data: None,
        };
        (self.status, axum::Json(body)).into_response()
    }
}
