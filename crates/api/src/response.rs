//! Response envelope shared by every operation.
//!
//! Success and failure use the same shape:
//!
//! ```json
//! { "status": 201, "code": null, "message": "club created", "data": { ... } }
//! ```
//!
//! The HTTP status always equals `status`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Standard `{ status, code, message, data }` envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: u16,
    pub code: Option<i32>,
    pub message: String,
    pub data: Option<T>,
}

/// Successful outcome of an operation.
#[derive(Debug)]
pub struct Success<T: Serialize> {
    pub status: StatusCode,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> Success<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl Success<()> {
    /// 200 without a payload.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            status: self.status.as_u16(),
            code: None,
            message: self.message,
            data: self.data,
        };
        (self.status, axum::Json(body)).into_response()
    }
}
