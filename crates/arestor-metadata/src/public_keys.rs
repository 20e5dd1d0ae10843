//! Indexed public key listing
//!
//! The key collection is stored as a JSON list of strings. Trailing path
//! segments address it:
//!
//! - `public-keys` lists `<index>=public_key` for every stored key
//! - `public-keys/<index>` names the formats available for one key
//! - `public-keys/<index>/<format>` returns the key material itself

use crate::codec;
use crate::error::{MetadataError, Result};
use crate::node::ResourceNode;
use crate::store::KeyedStore;
use crate::types::{DATA_FIELD, Method, Request, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Format listed for a single key
pub const KEY_FORMAT: &str = "openssh-key";

/// Leaf over an ordered collection addressed by index
pub struct IndexedListResource {
    store: Arc<dyn KeyedStore>,
    namespace: String,
    name: String,
}

impl fmt::Debug for IndexedListResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedListResource")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl IndexedListResource {
    /// Create a list resource reading `name` from `namespace`
    pub fn new(
        store: Arc<dyn KeyedStore>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    fn items(&self) -> Result<Vec<String>> {
        match self.store.get(&self.namespace, &self.name, DATA_FIELD) {
            Ok(raw) => Ok(codec::decode_list(Some(&raw))),
            Err(e) if e.is_not_found() => {
                debug!(namespace = %self.namespace, name = %self.name, "no stored list");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn item(&self, index: &str) -> Result<Value> {
        let index = parse_index(index)?;
        let items = self.items()?;
        items
            .get(index)
            .cloned()
            .map(Value::Text)
            .ok_or(MetadataError::IndexOutOfRange {
                index,
                len: items.len(),
            })
    }

    fn write(&self, body: Option<&str>) -> Result<Value> {
        let raw = body.ok_or_else(|| MetadataError::InvalidValue("missing value".to_string()))?;
        codec::validate_list(raw)?;
        self.store.set(&self.namespace, &self.name, DATA_FIELD, raw)?;
        Ok(Value::Empty)
    }
}

/// Parse an index segment
///
/// Accepts the bare index or the listing entry form `<index>=<label>`.
fn parse_index(segment: &str) -> Result<usize> {
    let index = segment
        .split_once('=')
        .map_or(segment, |(index, _label)| index);
    index
        .parse()
        .map_err(|_| MetadataError::InvalidIndex(segment.to_string()))
}

impl ResourceNode for IndexedListResource {
    fn dispatch(&self, request: &Request<'_>, path: &[&str]) -> Result<Value> {
        match (request.method, path) {
            (Method::Get, []) => Ok(Value::List(codec::encode_index_list(&self.items()?))),
            (Method::Set, []) => self.write(request.body),
            (Method::Get, [_index]) => Ok(Value::Text(KEY_FORMAT.to_string())),
            (Method::Get, [index, _format]) => self.item(index),
            (Method::Get, [_, _, extra, ..]) => Err(MetadataError::UnknownResource(extra.to_string())),
            (method, _) => Err(MetadataError::MethodNotAllowed(method)),
        }
    }

    fn is_collection(&self) -> bool {
        true
    }
}
