//! Remote collaborators of the club service.
//!
//! - [`discovery`] -- static round-robin service discovery.
//! - [`directory`] -- HTTP client for the student-directory service.
//!
//! Orchestration code only sees the [`RemoteServiceClient`] trait, so tests
//! can substitute a scripted implementation. Nothing here retries.

use std::time::Duration;

use async_trait::async_trait;

pub mod directory;
pub mod discovery;
pub mod error;

pub use directory::{CallMetadata, DirectoryClient, DirectoryResponse, StudentInform};
pub use discovery::{ServiceNode, StaticDiscovery};
pub use error::RemoteError;

#[async_trait]
pub trait RemoteServiceClient: Send + Sync {
    /// Resolve the node to call next for `service`.
    async fn next_service_node(&self, service: &str) -> Result<ServiceNode, RemoteError>;

    async fn student_inform_with_uuid(
        &self,
        node: &ServiceNode,
        meta: &CallMetadata,
        student_uuid: &str,
    ) -> Result<DirectoryResponse, RemoteError>;

    async fn student_informs_with_uuids(
        &self,
        node: &ServiceNode,
        meta: &CallMetadata,
        student_uuids: &[String],
    ) -> Result<DirectoryResponse, RemoteError>;
}

/// Production client: static discovery plus the HTTP directory client.
pub struct RemoteClient {
    discovery: StaticDiscovery,
    directory: DirectoryClient,
}

impl RemoteClient {
    pub fn new(discovery: StaticDiscovery, timeout: Duration) -> Self {
        Self {
            discovery,
            directory: DirectoryClient::new(timeout),
        }
    }
}

#[async_trait]
impl RemoteServiceClient for RemoteClient {
    async fn next_service_node(&self, service: &str) -> Result<ServiceNode, RemoteError> {
        self.discovery.next_node(service)
    }

    async fn student_inform_with_uuid(
        &self,
        node: &ServiceNode,
        meta: &CallMetadata,
        student_uuid: &str,
    ) -> Result<DirectoryResponse, RemoteError> {
        self.directory
            .student_inform_with_uuid(node, meta, student_uuid)
            .await
    }

    async fn student_informs_with_uuids(
        &self,
        node: &ServiceNode,
        meta: &CallMetadata,
        student_uuids: &[String],
    ) -> Result<DirectoryResponse, RemoteError> {
        self.directory
            .student_informs_with_uuids(node, meta, student_uuids)
            .await
    }
}
