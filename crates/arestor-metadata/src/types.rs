//! Metadata types
//!
//! Requests flowing into the dispatch tree and the values flowing out of it.

use base64::{Engine as _, engine::general_purpose};
use std::fmt;

/// Field holding the canonical stored value of a metadata item
pub const DATA_FIELD: &str = "data";

/// Verb understood by the dispatch tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read the resource
    Get,

    /// Store a new raw value for the resource
    Set,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Set => f.write_str("SET"),
        }
    }
}

/// A request delivered to the dispatch tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: Method,

    /// Raw value carried by a `Set`
    pub body: Option<&'a str>,
}

impl<'a> Request<'a> {
    /// Create a read request
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            body: None,
        }
    }

    /// Create a write request carrying `body`
    pub fn set(body: &'a str) -> Self {
        Self {
            method: Method::Set,
            body: Some(body),
        }
    }
}

/// How a stored value is interpreted when read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Stored text returned unchanged
    #[default]
    Raw,

    /// Stored text is a JSON document
    Json,

    /// Stored text is a base64 encoded blob
    Base64,
}

/// Value produced by a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nothing stored, or nothing usable
    Empty,

    /// Plain text
    Text(String),

    /// Opaque binary payload
    Bytes(Vec<u8>),

    /// Ordered list of text entries
    List(Vec<String>),

    /// Structured document
    Json(serde_json::Value),
}

impl Value {
    /// Check if the value carries anything
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Json(v) => v.is_null(),
        }
    }

    /// Get the value as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into a JSON document entry
    ///
    /// Binary payloads become a string: the text itself when it is UTF-8,
    /// else its base64 encoding.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::Empty => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s),
            Value::Bytes(b) => serde_json::Value::String(
                String::from_utf8(b)
                    .unwrap_or_else(|e| general_purpose::STANDARD.encode(e.into_bytes())),
            ),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::String).collect())
            }
            Value::Json(v) => v,
        }
    }

    /// Get the content type a transport should announce
    pub fn content_type(&self) -> &'static str {
        match self {
            Value::Empty | Value::Text(_) | Value::List(_) => "text/plain; charset=utf-8",
            Value::Bytes(_) => "application/octet-stream",
            Value::Json(_) => "application/json",
        }
    }
}
