//! Error types for metadata resolution

use crate::types::Method;
use thiserror::Error;

/// Error type for metadata operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// Key absent from the store
    #[error("no value stored for {namespace}/{name}/{field}")]
    NotFound {
        namespace: String,
        name: String,
        field: String,
    },

    /// Path segment matches no child, even after alias normalization
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// Path ends at a container that has no representation of its own
    #[error("not a resource: {0}")]
    NotAResource(String),

    /// Verb not supported by the addressed resource
    #[error("method {0} not allowed on this resource")]
    MethodNotAllowed(Method),

    /// List index that is not a non-negative integer
    #[error("invalid index: {0}")]
    InvalidIndex(String),

    /// List index past the end of the stored list
    #[error("index {index} out of range for {len} item(s)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Value rejected by a write
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Store failure unrelated to the key itself
    #[error("store backend error: {0}")]
    Backend(String),
}

impl MetadataError {
    pub(crate) fn not_found(namespace: &str, name: &str, field: &str) -> Self {
        MetadataError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
            field: field.to_string(),
        }
    }

    /// Whether the error only reports an absent key
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetadataError::NotFound { .. })
    }
}

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetadataError::not_found("ec2", "uuid", "data");
        assert_eq!(err.to_string(), "no value stored for ec2/uuid/data");
        assert!(err.is_not_found());

        let err = MetadataError::UnknownResource("bogus".to_string());
        assert_eq!(err.to_string(), "unknown resource: bogus");
        assert!(!err.is_not_found());

        let err = MetadataError::MethodNotAllowed(Method::Set);
        assert_eq!(err.to_string(), "method SET not allowed on this resource");

        let err = MetadataError::IndexOutOfRange { index: 5, len: 2 };
        assert_eq!(err.to_string(), "index 5 out of range for 2 item(s)");
    }
}
