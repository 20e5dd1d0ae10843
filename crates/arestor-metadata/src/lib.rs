//! Arestor Metadata
//!
//! This crate resolves cloud instance-metadata requests for mocked
//! providers (EC2 and DigitalOcean style) against a namespaced key/value
//! store.
//!
//! # Overview
//!
//! Guests query paths like `/2009-04-04/meta-data/instance-id` or
//! `/metadata/v1/region`. Each provider is a tree of resources; walking the
//! tree maps the path onto a `(namespace, name, field)` store key, and the
//! resource decodes the stored text (raw, JSON or base64) into the shape the
//! real provider would return.
//!
//! # Example
//!
//! ```
//! use arestor_metadata::{KeyedStore, MemoryStore, MetadataService, Provider, Value, DATA_FIELD};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn KeyedStore> = Arc::new(MemoryStore::new());
//! store.set("ec2", "uuid", DATA_FIELD, "i-1234").unwrap();
//! store.set("digitalocean", "region", DATA_FIELD, "\"nyc3\"").unwrap();
//!
//! let ec2 = MetadataService::new(Provider::Ec2, store.clone());
//! assert_eq!(
//!     ec2.resolve("2009-04-04/meta-data/instance-id").unwrap(),
//!     Value::Text("i-1234".to_string())
//! );
//!
//! let digitalocean = MetadataService::new(Provider::DigitalOcean, store);
//! assert_eq!(
//!     digitalocean.resolve("metadata/v1/region").unwrap(),
//!     Value::Text("nyc3".to_string())
//! );
//! ```
//!
//! # Aliases
//!
//! Segments are matched as given first, then with `_` swapped for `-` and
//! the reverse, so `meta_data/local_hostname` reaches
//! `meta-data/local-hostname`.

pub mod alias;
pub mod codec;
pub mod error;
pub mod node;
pub mod providers;
pub mod public_keys;
pub mod service;
pub mod store;
pub mod types;

pub use error::{MetadataError, Result};
pub use node::{CompositeLeaf, Container, Leaf, Node, ResourceNode};
pub use providers::Provider;
pub use public_keys::IndexedListResource;
pub use service::{MetadataService, split_path};
pub use store::{KeyedStore, MemoryStore};
pub use types::{DATA_FIELD, Encoding, Method, Request, Value};
