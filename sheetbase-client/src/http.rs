//! HTTP implementation of the endpoint traits.

use crate::envelope::{
    decode_envelope, DocumentPayload, MessagePayload, ProjectRequest, ProjectSummary,
    ProjectsPayload,
};
use crate::{DocumentRemote, ProjectRegistry};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use sheetbase_core::{ConfigError, Document, EndpointError, PartitionKey};
use std::time::Duration;

/// Media type of every request body. Bodies are raw JSON text.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Query parameter carrying the partition key.
pub const PARTITION_PARAM: &str = "projectId";

/// Query parameter selecting the endpoint action for POST requests.
pub const ACTION_PARAM: &str = "action";

const ACTION_SAVE_DATA: &str = "saveData";
const ACTION_GET_PROJECTS: &str = "getProjects";
const ACTION_ADD_PROJECT: &str = "addProject";
const ACTION_DELETE_PROJECT: &str = "deleteProject";

/// Longest response excerpt kept in a protocol error.
const MAX_ERROR_BODY: usize = 200;

/// Parse `url` the way [`HttpEndpoint`] will use it: trimmed, http(s), and
/// accepted by the URL parser.
pub fn parse_endpoint_url(field: &str, url: &str) -> Result<Url, ConfigError> {
    sheetbase_core::validate_endpoint_url(field, url)?;
    Url::parse(url.trim()).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        value: url.to_string(),
        reason: e.to_string(),
    })
}

/// Spreadsheet endpoint reached over HTTP.
#[derive(Clone)]
pub struct HttpEndpoint {
    client: Client,
    base_url: Url,
}

impl HttpEndpoint {
    /// Create a client for `endpoint_url` with a per-request timeout.
    pub fn new(endpoint_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = parse_endpoint_url("endpoint_url", endpoint_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "request_timeout_ms".to_string(),
                value: timeout.as_millis().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL plus `params`, keeping any query the base already carries.
    fn url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
        }
        url
    }

    async fn get_envelope<P: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<(P, Option<String>), EndpointError> {
        let url = self.url(params);
        tracing::debug!(url = %url, "GET endpoint");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;
        read_envelope(response).await
    }

    async fn post_envelope<P: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
        body: String,
    ) -> Result<(P, Option<String>), EndpointError> {
        let url = self.url(params);
        tracing::debug!(url = %url, body_bytes = body.len(), "POST endpoint");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;
        read_envelope(response).await
    }
}

async fn read_envelope<P: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<(P, Option<String>), EndpointError> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(EndpointError::protocol(
            Some(status.as_u16()),
            excerpt(&text),
        ));
    }
    decode_envelope(status.as_u16(), &text)
}

fn transport_error(err: reqwest::Error) -> EndpointError {
    let reason = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    EndpointError::transport(reason)
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

fn to_body<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, EndpointError> {
    serde_json::to_string(value)
        .map_err(|e| EndpointError::protocol(None, format!("Failed to encode request: {}", e)))
}

#[async_trait]
impl DocumentRemote for HttpEndpoint {
    async fn fetch_document(&self, partition: &PartitionKey) -> Result<Document, EndpointError> {
        let (payload, _) = self
            .get_envelope::<DocumentPayload>(&[(PARTITION_PARAM, partition.as_str())])
            .await?;
        Ok(payload.data.unwrap_or_default())
    }

    async fn persist_document(
        &self,
        partition: &PartitionKey,
        document: &Document,
    ) -> Result<(), EndpointError> {
        let body = to_body(document)?;
        self.post_envelope::<MessagePayload>(
            &[
                (ACTION_PARAM, ACTION_SAVE_DATA),
                (PARTITION_PARAM, partition.as_str()),
            ],
            body,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectRegistry for HttpEndpoint {
    async fn list_projects(&self) -> Result<Vec<ProjectSummary>, EndpointError> {
        let (payload, _) = self
            .post_envelope::<ProjectsPayload>(&[(ACTION_PARAM, ACTION_GET_PROJECTS)], String::new())
            .await?;
        Ok(payload.projects.unwrap_or_default())
    }

    async fn add_project(&self, request: &ProjectRequest) -> Result<Option<String>, EndpointError> {
        let (_, message) = self
            .post_envelope::<MessagePayload>(
                &[(ACTION_PARAM, ACTION_ADD_PROJECT)],
                to_body(request)?,
            )
            .await?;
        Ok(message)
    }

    async fn delete_project(
        &self,
        request: &ProjectRequest,
    ) -> Result<Option<String>, EndpointError> {
        let (_, message) = self
            .post_envelope::<MessagePayload>(
                &[(ACTION_PARAM, ACTION_DELETE_PROJECT)],
                to_body(request)?,
            )
            .await?;
        Ok(message)
    }
}

impl std::fmt::Debug for HttpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEndpoint")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
