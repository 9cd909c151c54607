//! Document schema: the known top-level keys of a partition document.
//!
//! The schema is the single source of truth for two decisions the cache has
//! to make without talking to the remote:
//!
//! - which document to substitute when the initial fetch fails (the
//!   fallback document), and
//! - which keys are session-only and must never be uploaded (transient keys).

use crate::{Document, JsonValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Shape of a top-level document entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// An entity collection, stored as a JSON array.
    Collection,
    /// A single JSON object.
    Record,
    /// Any other JSON value.
    Scalar,
}

/// One known top-level key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Session-only keys are kept in memory but stripped from uploads.
    #[serde(default)]
    pub transient: bool,
    /// Value used in the fallback document. Collections default to `[]`,
    /// records to `{}`; scalars without a default are left out.
    #[serde(default)]
    pub default: Option<JsonValue>,
}

impl FieldSpec {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Collection,
            transient: false,
            default: None,
        }
    }

    pub fn record(name: impl Into<String>, default: JsonValue) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Record,
            transient: false,
            default: Some(default),
        }
    }

    pub fn transient(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar,
            transient: true,
            default: None,
        }
    }

    fn fallback_value(&self) -> Option<JsonValue> {
        if let Some(default) = &self.default {
            return Some(default.clone());
        }
        match self.kind {
            FieldKind::Collection => Some(JsonValue::Array(Vec::new())),
            FieldKind::Record => Some(JsonValue::Object(Document::new())),
            FieldKind::Scalar => None,
        }
    }
}

/// Entity collections of the standard site document.
pub const SITE_COLLECTIONS: [&str; 7] = [
    "announcements",
    "gallery",
    "inquiries",
    "volunteers",
    "messages",
    "events",
    "projects",
];

/// Key holding the admin login pair.
pub const ADMIN_CREDENTIALS_KEY: &str = "adminCredentials";

/// Session flag set by the admin pages after a successful login.
pub const ADMIN_SESSION_KEY: &str = "isAdminLoggedIn";

/// The set of known keys for a partition document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSchema {
    fields: Vec<FieldSpec>,
}

impl DocumentSchema {
    /// Build a schema from field specs. Later duplicates replace earlier ones.
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        let mut deduped: Vec<FieldSpec> = Vec::new();
        for field in fields {
            if let Some(existing) = deduped.iter_mut().find(|f| f.name == field.name) {
                *existing = field;
            } else {
                deduped.push(field);
            }
        }
        Self { fields: deduped }
    }

    /// The standard site schema: seven entity collections, default admin
    /// credentials and the admin session flag.
    pub fn site() -> Self {
        let mut fields: Vec<FieldSpec> = SITE_COLLECTIONS
            .iter()
            .map(|name| FieldSpec::collection(*name))
            .collect();
        fields.push(FieldSpec::record(
            ADMIN_CREDENTIALS_KEY,
            json!({ "username": "admin", "password": "admin123" }),
        ));
        fields.push(FieldSpec::transient(ADMIN_SESSION_KEY));
        Self::new(fields)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_transient(&self, key: &str) -> bool {
        self.field(key).is_some_and(|f| f.transient)
    }

    /// Names of every entity collection.
    pub fn entity_kinds(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Collection && !f.transient)
            .map(|f| f.name.as_str())
    }

    /// The document substituted when the initial fetch fails.
    pub fn fallback_document(&self) -> Document {
        self.fields
            .iter()
            .filter(|f| !f.transient)
            .filter_map(|f| f.fallback_value().map(|v| (f.name.clone(), v)))
            .collect()
    }

    /// Copy of `document` without transient keys, ready for upload.
    pub fn strip_transient(&self, document: &Document) -> Document {
        document
            .iter()
            .filter(|(key, _)| !self.is_transient(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl Default for DocumentSchema {
    fn default() -> Self {
        Self::site()
    }
}
