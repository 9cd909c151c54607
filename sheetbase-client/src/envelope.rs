//! Wire types for the endpoint's response envelope and project registry.
//!
//! Every response is a JSON object with a `status` discriminator. Success
//! payload fields sit next to it (`data`, `projects`); failures carry a
//! `message`.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sheetbase_core::{Document, EndpointError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
    /// Any other status string. Treated as a failure.
    #[serde(other)]
    Unknown,
}

/// Response wrapper shared by every endpoint action.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<P> {
    pub status: EnvelopeStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> Envelope<P> {
    /// Split into payload and message, or the remote's failure.
    pub fn into_result(self) -> Result<(P, Option<String>), EndpointError> {
        match self.status {
            EnvelopeStatus::Success => Ok((self.payload, self.message)),
            EnvelopeStatus::Error | EnvelopeStatus::Unknown => Err(EndpointError::remote(
                self.message
                    .unwrap_or_else(|| "Unknown error from endpoint".to_string()),
            )),
        }
    }
}

/// `data` payload of a document fetch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPayload {
    #[serde(default)]
    pub data: Option<Document>,
}

/// `projects` payload of `getProjects`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectsPayload {
    #[serde(default)]
    pub projects: Option<Vec<ProjectSummary>>,
}

/// Envelopes that only carry a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePayload {}

/// One row of the project registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(deserialize_with = "text_or_number")]
    pub project_id: String,
    /// Sheet cell where the project's document lives.
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub cell_location: Option<String>,
    /// Whether the project is password protected. The endpoint reports either
    /// a boolean or the stored password itself.
    #[serde(default, rename = "password", deserialize_with = "protected_flag")]
    pub password_protected: bool,
}

/// Body of `addProject` and `deleteProject`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProjectRequest {
    pub fn new(project_id: impl Into<String>, password: Option<String>) -> Self {
        Self {
            project_id: project_id.into(),
            password,
        }
    }
}

/// Decode a 2xx response body into payload and message.
pub fn decode_envelope<P: DeserializeOwned>(
    http_status: u16,
    body: &str,
) -> Result<(P, Option<String>), EndpointError> {
    let envelope: Envelope<P> = serde_json::from_str(body).map_err(|e| {
        EndpointError::protocol(Some(http_status), format!("Malformed envelope: {}", e))
    })?;
    envelope.into_result()
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn optional_text_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn protected_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_with_data() {
        let body = r#"{"status":"success","data":{"events":[{"id":1}]}}"#;
        let (payload, message) = decode_envelope::<DocumentPayload>(200, body).unwrap();
        let data = payload.data.unwrap();
        assert_eq!(data.get("events"), Some(&json!([{"id": 1}])));
        assert!(message.is_none());
    }

    #[test]
    fn test_success_without_data() {
        let (payload, _) =
            decode_envelope::<DocumentPayload>(200, r#"{"status":"success"}"#).unwrap();
        assert!(payload.data.is_none());
    }

    #[test]
    fn test_error_envelope_is_remote_error() {
        let body = r#"{"status":"error","message":"Sheet 'Data' not found"}"#;
        let err = decode_envelope::<DocumentPayload>(200, body).unwrap_err();
        assert_eq!(err, EndpointError::remote("Sheet 'Data' not found"));
    }

    #[test]
    fn test_unknown_status_is_failure() {
        let err = decode_envelope::<MessagePayload>(200, r#"{"status":"pending"}"#).unwrap_err();
        assert!(matches!(err, EndpointError::Remote { .. }));
    }

    #[test]
    fn test_malformed_body_is_protocol_error() {
        let err = decode_envelope::<DocumentPayload>(200, "<html>Moved</html>").unwrap_err();
        assert!(matches!(err, EndpointError::Protocol { status: Some(200), .. }));

        // `data` must be an object
        let err = decode_envelope::<DocumentPayload>(200, r#"{"status":"success","data":[1]}"#)
            .unwrap_err();
        assert!(matches!(err, EndpointError::Protocol { .. }));
    }

    #[test]
    fn test_project_summary_lenient_fields() {
        let body = json!({
            "status": "success",
            "projects": [
                {"projectId": "alpha", "cellLocation": "B2", "password": true},
                {"projectId": 42, "cellLocation": "B3", "password": "hunter2"},
                {"projectId": "gamma", "cellLocation": "", "password": ""},
                {"projectId": "delta"}
            ]
        })
        .to_string();
        let (payload, _) = decode_envelope::<ProjectsPayload>(200, &body).unwrap();
        let projects = payload.projects.unwrap();
        assert_eq!(projects.len(), 4);
        assert_eq!(projects[0].cell_location.as_deref(), Some("B2"));
        assert!(projects[0].password_protected);
        assert_eq!(projects[1].project_id, "42");
        assert!(projects[1].password_protected);
        assert!(projects[2].cell_location.is_none());
        assert!(!projects[2].password_protected);
        assert!(!projects[3].password_protected);
    }

    #[test]
    fn test_project_request_omits_absent_password() {
        let without = ProjectRequest::new("alpha", None);
        assert_eq!(
            serde_json::to_value(&without).unwrap(),
            json!({"projectId": "alpha"})
        );
        let with = ProjectRequest::new("alpha", Some("s3cret".to_string()));
        assert_eq!(
            serde_json::to_value(&with).unwrap(),
            json!({"projectId": "alpha", "password": "s3cret"})
        );
    }

    #[test]
    fn test_message_payload_keeps_message() {
        let (_, message) = decode_envelope::<MessagePayload>(
            200,
            r#"{"status":"success","message":"Project 'alpha' added."}"#,
        )
        .unwrap();
        assert_eq!(message.as_deref(), Some("Project 'alpha' added."));
    }
}
