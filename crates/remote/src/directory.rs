//! HTTP client for the student-directory service.
//!
//! The directory answers with a JSON envelope carrying its own `status`.
//! A 404 inside that envelope is a normal reply ("no such student"), not a
//! transport failure, so it is returned as `Ok` for the caller to judge.

use std::time::Duration;

use club_core::trace::{TraceContext, REQUEST_ID_HEADER, SPAN_CONTEXT_HEADER};
use serde::{Deserialize, Serialize};

use crate::discovery::ServiceNode;
use crate::error::RemoteError;

/// Header naming the caller on whose behalf the call is made.
pub const CALLER_UUID_HEADER: &str = "x-caller-uuid";

pub const STUDENTS_WITH_UUIDS_PATH: &str = "/v1/students/uuids";
pub const STUDENT_WITH_UUID_PATH: &str = "/v1/students/uuid";

/// Correlation and identity forwarded with every outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMetadata {
    pub trace: TraceContext,
    pub caller_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInform {
    pub student_uuid: String,
    #[serde(default)]
    pub student_number: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profile_uri: String,
}

/// Reply envelope of the directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryResponse {
    pub status: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub student_informs: Vec<StudentInform>,
}

impl DirectoryResponse {
    pub fn found(student_informs: Vec<StudentInform>) -> Self {
        Self {
            status: 200,
            message: String::new(),
            student_informs,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            student_informs: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StudentUuidsRequest<'a> {
    student_uuids: &'a [String],
}

/// Thin `reqwest` wrapper; one instance is shared by all requests.
#[derive(Clone)]
pub struct DirectoryClient {
    client: reqwest::Client,
}

impl DirectoryClient {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }

    /// `GET /v1/students/uuid/{student_uuid}`
    pub async fn student_inform_with_uuid(
        &self,
        node: &ServiceNode,
        meta: &CallMetadata,
        student_uuid: &str,
    ) -> Result<DirectoryResponse, RemoteError> {
        let request = self.client.get(format!(
            "{}{STUDENT_WITH_UUID_PATH}/{student_uuid}",
            node.base_url()
        ));
        let response = with_metadata(request, meta).send().await?;
        read_envelope(response).await
    }

    /// `POST /v1/students/uuids` with `{"student_uuids": [...]}`
    pub async fn student_informs_with_uuids(
        &self,
        node: &ServiceNode,
        meta: &CallMetadata,
        student_uuids: &[String],
    ) -> Result<DirectoryResponse, RemoteError> {
        let request = self
            .client
            .post(format!("{}{STUDENTS_WITH_UUIDS_PATH}", node.base_url()))
            .json(&StudentUuidsRequest { student_uuids });
        let response = with_metadata(request, meta).send().await?;
        read_envelope(response).await
    }
}

fn with_metadata(request: reqwest::RequestBuilder, meta: &CallMetadata) -> reqwest::RequestBuilder {
    let outbound = meta.trace.child();
    request
        .header(REQUEST_ID_HEADER, outbound.request_id.to_string())
        .header(SPAN_CONTEXT_HEADER, outbound.span.to_string())
        .header(CALLER_UUID_HEADER, meta.caller_uuid.as_str())
}

async fn read_envelope(response: reqwest::Response) -> Result<DirectoryResponse, RemoteError> {
    let status = response.status();
    let body = response.bytes().await?;

    match serde_json::from_slice::<DirectoryResponse>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(RemoteError::UnexpectedStatus(status.as_u16())),
        Err(e) => Err(RemoteError::UnexpectedError(format!(
            "undecodable directory reply: {e}"
        ))),
    }
}
