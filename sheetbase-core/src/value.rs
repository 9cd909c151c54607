//! Structural copies of document values.
//!
//! `serde_json::Value` is a closed set of JSON shapes (null, bool, number,
//! string, array, object) that owns all of its children, so cloning it is a
//! full structural deep copy with no shared references and no cycles.
//! Typed input enters the document through [`to_document_value`], which
//! reports input without a JSON shape as an error instead of dropping it.

use crate::{CacheError, JsonValue};
use serde::Serialize;

/// Deep copy of a stored value.
pub fn copy_value(value: &JsonValue) -> JsonValue {
    value.clone()
}

/// Convert a typed value into a document value stored under `key`.
///
/// Fails on maps with non-string keys and on `Serialize` impls that error.
/// Note that serde_json encodes non-finite floats as `null`.
pub fn to_document_value<T: Serialize + ?Sized>(
    key: &str,
    value: &T,
) -> Result<JsonValue, CacheError> {
    serde_json::to_value(value).map_err(|e| CacheError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
