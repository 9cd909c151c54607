//! Client layer for the remote spreadsheet endpoint.
//!
//! The endpoint is reachable through two traits: [`DocumentRemote`] for the
//! per-partition document and [`ProjectRegistry`] for the operator's project
//! list. [`HttpEndpoint`] implements both over HTTP.

use async_trait::async_trait;
use sheetbase_core::{Document, EndpointError, PartitionKey};

pub mod envelope;
pub mod http;

pub use envelope::{
    decode_envelope, DocumentPayload, Envelope, EnvelopeStatus, MessagePayload, ProjectRequest,
    ProjectSummary, ProjectsPayload,
};
pub use http::{parse_endpoint_url, HttpEndpoint};

/// Fetch and persist one partition's document.
#[async_trait]
pub trait DocumentRemote: Send + Sync {
    /// Fetch the current document for `partition`.
    ///
    /// A success envelope without `data` yields an empty document.
    async fn fetch_document(&self, partition: &PartitionKey) -> Result<Document, EndpointError>;

    /// Upload `document` as the full state of `partition`.
    async fn persist_document(
        &self,
        partition: &PartitionKey,
        document: &Document,
    ) -> Result<(), EndpointError>;
}

/// Project registry operations used by the manager surface.
#[async_trait]
pub trait ProjectRegistry: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, EndpointError>;

    /// Register a project. Returns the remote's confirmation message, if any.
    async fn add_project(&self, request: &ProjectRequest) -> Result<Option<String>, EndpointError>;

    /// Delete a project. Returns the remote's confirmation message, if any.
    async fn delete_project(
        &self,
        request: &ProjectRequest,
    ) -> Result<Option<String>, EndpointError>;
}
