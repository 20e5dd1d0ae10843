//! Value codec
//!
//! Pure functions turning raw stored text into [`Value`]s according to a
//! declared [`Encoding`], plus the list encoding used by key listings.
//!
//! Reads are lenient: text that does not decode under its encoding is
//! reported as absence, never as an error. Writes are strict, see
//! [`validate`].

use crate::error::{MetadataError, Result};
use crate::types::{Encoding, Value};
use base64::{Engine as _, engine::general_purpose};
use tracing::warn;

/// Label attached to every entry of an index listing
pub const INDEX_LIST_LABEL: &str = "public_key";

/// Decode a raw stored value
///
/// `raw` is `None` when the key is absent from the store. Absent and
/// undecodable values read the same: [`Value::Empty`], or empty bytes for
/// base64.
pub fn decode(raw: Option<&str>, encoding: Encoding) -> Value {
    raw.and_then(|raw| try_decode(raw, encoding))
        .unwrap_or_else(|| match encoding {
            Encoding::Base64 => Value::Bytes(Vec::new()),
            Encoding::Raw | Encoding::Json => Value::Empty,
        })
}

/// Decode a value known to be present in the store
///
/// Returns `None` only when `raw` does not decode under `encoding`. A stored
/// JSON `null` decodes to [`Value::Empty`].
pub fn try_decode(raw: &str, encoding: Encoding) -> Option<Value> {
    match encoding {
        Encoding::Raw => Some(Value::Text(raw.to_string())),
        Encoding::Json => decode_json(raw),
        Encoding::Base64 => match decode_base64(raw) {
            Ok(bytes) => Some(Value::Bytes(bytes)),
            Err(e) => {
                warn!(error = %e, "stored value is not valid base64, treating as absent");
                None
            }
        },
    }
}

fn decode_json(raw: &str) -> Option<Value> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Null) => Some(Value::Empty),
        Ok(serde_json::Value::String(s)) => Some(Value::Text(s)),
        Ok(serde_json::Value::Array(items)) if items.iter().all(|v| v.is_string()) => {
            Some(Value::List(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        serde_json::Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ))
        }
        Ok(doc) => Some(Value::Json(doc)),
        Err(e) => {
            warn!(error = %e, "stored value is not valid JSON, treating as absent");
            None
        }
    }
}

/// Decode base64 text, bare or wrapped in a JSON string
fn decode_base64(raw: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let quoted = serde_json::from_str::<String>(raw).ok();
    let payload = quoted.as_deref().unwrap_or(raw);
    general_purpose::STANDARD.decode(payload.trim())
}

/// Decode a stored JSON list of strings
///
/// Absent or malformed input yields an empty list.
pub fn decode_list(raw: Option<&str>) -> Vec<String> {
    match decode(raw, Encoding::Json) {
        Value::List(items) => items,
        Value::Empty => Vec::new(),
        other => {
            warn!(value = ?other, "stored value is not a list of strings, treating as absent");
            Vec::new()
        }
    }
}

/// Encode the index listing of an ordered collection
///
/// Produces `"<index>=public_key"` for each item, in order.
pub fn encode_index_list<T>(items: &[T]) -> Vec<String> {
    (0..items.len())
        .map(|i| format!("{}={}", i, INDEX_LIST_LABEL))
        .collect()
}

/// Check that `raw` is acceptable for storage under `encoding`
pub fn validate(raw: &str, encoding: Encoding) -> Result<()> {
    match encoding {
        Encoding::Raw => Ok(()),
        Encoding::Json => serde_json::from_str::<serde_json::Value>(raw)
            .map(|_| ())
            .map_err(|e| MetadataError::InvalidValue(format!("not a JSON document: {}", e))),
        Encoding::Base64 => decode_base64(raw)
            .map(|_| ())
            .map_err(|e| MetadataError::InvalidValue(format!("not base64: {}", e))),
    }
}

/// Check that `raw` is a JSON list of strings
pub fn validate_list(raw: &str) -> Result<()> {
    serde_json::from_str::<Vec<String>>(raw)
        .map(|_| ())
        .map_err(|e| MetadataError::InvalidValue(format!("not a JSON list of strings: {}", e)))
}
