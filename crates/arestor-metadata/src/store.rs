//! Keyed storage for metadata values
//!
//! The dispatch tree reads and writes through the [`KeyedStore`] trait.
//! [`MemoryStore`] is the in-process implementation; it lives as long as
//! the process does.

use crate::error::{MetadataError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// Namespaced key/value storage
///
/// Values are addressed by `(namespace, name, field)`. The trait is
/// object-safe and meant to be shared as `Arc<dyn KeyedStore>`.
pub trait KeyedStore: Send + Sync {
    /// Get the value stored under a key
    ///
    /// Fails with [`MetadataError::NotFound`] if the key is absent.
    fn get(&self, namespace: &str, name: &str, field: &str) -> Result<String>;

    /// Store or replace the value under a key
    ///
    /// Fails with [`MetadataError::InvalidValue`] if the value cannot be stored.
    fn set(&self, namespace: &str, name: &str, field: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StoreKey {
    namespace: String,
    name: String,
    field: String,
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyedStore for MemoryStore {
    fn get(&self, namespace: &str, name: &str, field: &str) -> Result<String> {
        let guard = self.entries.read().map_err(|e| {
            MetadataError::Backend(format!("lock poisoned: {}", e))
        })?;
        let key = StoreKey {
            namespace: namespace.to_string(),
            name: name.to_string(),
            field: field.to_string(),
        };
        guard
            .get(&key)
            .cloned()
            .ok_or_else(|| MetadataError::not_found(namespace, name, field))
    }

    fn set(&self, namespace: &str, name: &str, field: &str, value: &str) -> Result<()> {
        if namespace.is_empty() || name.is_empty() || field.is_empty() {
            return Err(MetadataError::InvalidValue(format!(
                "incomplete key {}/{}/{}",
                namespace, name, field
            )));
        }

        let mut guard = self.entries.write().map_err(|e| {
            MetadataError::Backend(format!("lock poisoned: {}", e))
        })?;
        guard.insert(
            StoreKey {
                namespace: namespace.to_string(),
                name: name.to_string(),
                field: field.to_string(),
            },
            value.to_string(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_then_get() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("ec2", "uuid", "data", "i-1234").unwrap();
        assert_eq!(store.get("ec2", "uuid", "data").unwrap(), "i-1234");
        assert_eq!(store.len(), 1);

        // Overwrite keeps a single entry
        store.set("ec2", "uuid", "data", "i-5678").unwrap();
        assert_eq!(store.get("ec2", "uuid", "data").unwrap(), "i-5678");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = MemoryStore::new();
        store.set("ec2", "hostname", "data", "ec2-host").unwrap();

        let err = store.get("digitalocean", "hostname", "data").unwrap_err();
        assert_eq!(
            err,
            MetadataError::NotFound {
                namespace: "digitalocean".to_string(),
                name: "hostname".to_string(),
                field: "data".to_string(),
            }
        );
    }

    #[test]
    fn test_fields_are_isolated() {
        let store = MemoryStore::new();
        store.set("ec2", "hostname", "data", "host").unwrap();
        assert!(store.get("ec2", "hostname", "other").unwrap_err().is_not_found());
    }

    #[test]
    fn test_incomplete_key_rejected() {
        let store = MemoryStore::new();
        let err = store.set("ec2", "", "data", "x").unwrap_err();
        assert!(matches!(err, MetadataError::InvalidValue(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        let store: Arc<dyn KeyedStore> = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .set("ec2", &format!("item-{}", i), "data", "v")
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for i in 0..4 {
            assert_eq!(store.get("ec2", &format!("item-{}", i), "data").unwrap(), "v");
        }
    }
}
