//! Resource dispatch tree
//!
//! A provider's resource hierarchy is a tree of [`ResourceNode`]s built once
//! at startup and never mutated afterwards. Containers route path segments
//! to their children; leaves execute reads and writes against a
//! [`KeyedStore`].
//!
//! ```text
//! Container ──segment──▶ Container ──segment──▶ Leaf ──get/set──▶ KeyedStore
//!                                  └─segment──▶ IndexedListResource
//! ```

use crate::alias::resolve_alias;
use crate::codec;
use crate::error::{MetadataError, Result};
use crate::store::KeyedStore;
use crate::types::{DATA_FIELD, Encoding, Method, Request, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A node of the dispatch tree
///
/// Nodes are shared between request handlers and hold no per-request state.
pub trait ResourceNode: Send + Sync + fmt::Debug {
    /// Dispatch `request` to the resource addressed by `path`
    ///
    /// `path` holds the segments remaining below this node.
    fn dispatch(&self, request: &Request<'_>, path: &[&str]) -> Result<Value>;

    /// Whether the node addresses further sub-paths
    ///
    /// Collections are listed with a trailing `/` by their parent.
    fn is_collection(&self) -> bool {
        false
    }
}

/// Shared handle to a node
pub type Node = Arc<dyn ResourceNode>;

/// Routing node holding named children
#[derive(Debug)]
pub struct Container {
    label: String,
    children: IndexMap<String, Node>,
    listing: bool,
}

impl Container {
    /// Create an empty container
    ///
    /// `label` only shows up in errors and logs.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: IndexMap::new(),
            listing: false,
        }
    }

    /// Register a child under `name`
    pub fn with_child(self, name: impl Into<String>, node: impl ResourceNode + 'static) -> Self {
        self.with_node(name, Arc::new(node))
    }

    /// Register an already shared child under `name`
    ///
    /// The same node may be registered under several names.
    pub fn with_node(mut self, name: impl Into<String>, node: Node) -> Self {
        self.children.insert(name.into(), node);
        self
    }

    /// Answer GET on the container itself with a listing of its children
    pub fn with_listing(mut self) -> Self {
        self.listing = true;
        self
    }

    /// Get the diagnostic label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Child names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Look up the child addressed by `segment`, resolving aliases
    pub fn child(&self, segment: &str) -> Result<&Node> {
        let name = resolve_alias(segment, |name| self.children.contains_key(name))?;
        self.children
            .get(name.as_ref())
            .ok_or_else(|| MetadataError::UnknownResource(segment.to_string()))
    }

    fn listing(&self) -> Vec<String> {
        self.children
            .iter()
            .map(|(name, node)| {
                if node.is_collection() {
                    format!("{}/", name)
                } else {
                    name.clone()
                }
            })
            .collect()
    }
}

impl ResourceNode for Container {
    fn dispatch(&self, request: &Request<'_>, path: &[&str]) -> Result<Value> {
        let Some((segment, rest)) = path.split_first() else {
            return match (request.method, self.listing) {
                (Method::Get, true) => Ok(Value::List(self.listing())),
                (method, true) => Err(MetadataError::MethodNotAllowed(method)),
                (_, false) => Err(MetadataError::NotAResource(self.label.clone())),
            };
        };

        let child = self.child(segment)?;
        debug!(container = %self.label, segment = %segment, "descending");
        child.dispatch(request, rest)
    }

    fn is_collection(&self) -> bool {
        true
    }
}

/// Terminal node bound to one `(namespace, name)` pair
#[derive(Clone)]
pub struct Leaf {
    store: Arc<dyn KeyedStore>,
    namespace: String,
    name: String,
    encoding: Encoding,
    writable: bool,
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("encoding", &self.encoding)
            .field("writable", &self.writable)
            .finish_non_exhaustive()
    }
}

impl Leaf {
    /// Create a leaf reading `name` from `namespace`
    pub fn new(
        store: Arc<dyn KeyedStore>,
        namespace: impl Into<String>,
        name: impl Into<String>,
        encoding: Encoding,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            name: name.into(),
            encoding,
            writable: true,
        }
    }

    /// Refuse `Set` on this leaf
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Get the store key name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the declared encoding
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Fetch the raw stored value
    ///
    /// An absent key is `Ok(None)`; only backend failures are errors.
    pub fn fetch(&self) -> Result<Option<String>> {
        match self.store.get(&self.namespace, &self.name, DATA_FIELD) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.is_not_found() => {
                debug!(namespace = %self.namespace, name = %self.name, "no stored value");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Read and decode the stored value
    pub fn read(&self) -> Result<Value> {
        let raw = self.fetch()?;
        Ok(codec::decode(raw.as_deref(), self.encoding))
    }

    /// Validate and store a new raw value
    pub fn write(&self, body: Option<&str>) -> Result<Value> {
        let raw = body.ok_or_else(|| MetadataError::InvalidValue("missing value".to_string()))?;
        codec::validate(raw, self.encoding)?;
        self.store.set(&self.namespace, &self.name, DATA_FIELD, raw)?;
        debug!(namespace = %self.namespace, name = %self.name, "stored value");
        Ok(Value::Empty)
    }
}

impl ResourceNode for Leaf {
    fn dispatch(&self, request: &Request<'_>, path: &[&str]) -> Result<Value> {
        if let Some(segment) = path.first() {
            return Err(MetadataError::UnknownResource(segment.to_string()));
        }

        match request.method {
            Method::Get => self.read(),
            Method::Set if self.writable => self.write(request.body),
            Method::Set => Err(MetadataError::MethodNotAllowed(Method::Set)),
        }
    }
}

/// Read-only leaf aggregating several leaves into one JSON document
///
/// A field whose key is absent, or whose value does not decode, is `null`;
/// it never fails the document as a whole. Present values keep their shape,
/// so a stored `""` or `[]` stays `""` or `[]`. Binary payloads that are not
/// UTF-8 are rendered as base64, see [`Value::into_json`].
#[derive(Debug, Default)]
pub struct CompositeLeaf {
    fields: Vec<(String, Leaf)>,
}

impl CompositeLeaf {
    /// Create an empty composite
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `leaf` as document field `key`
    pub fn with_field(mut self, key: impl Into<String>, leaf: Leaf) -> Self {
        self.fields.push((key.into(), leaf));
        self
    }

    fn read(&self) -> Result<Value> {
        let mut doc = serde_json::Map::with_capacity(self.fields.len());
        for (key, leaf) in &self.fields {
            let entry = leaf
                .fetch()?
                .and_then(|raw| codec::try_decode(&raw, leaf.encoding()))
                .map_or(serde_json::Value::Null, Value::into_json);
            doc.insert(key.clone(), entry);
        }
        Ok(Value::Json(serde_json::Value::Object(doc)))
    }
}

impl ResourceNode for CompositeLeaf {
    fn dispatch(&self, request: &Request<'_>, path: &[&str]) -> Result<Value> {
        if let Some(segment) = path.first() {
            return Err(MetadataError::UnknownResource(segment.to_string()));
        }

        match request.method {
            Method::Get => self.read(),
            method => Err(MetadataError::MethodNotAllowed(method)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store() -> Arc<dyn KeyedStore> {
        Arc::new(MemoryStore::new())
    }

    fn tree(store: &Arc<dyn KeyedStore>) -> Container {
        Container::new("root").with_child(
            "meta-data",
            Container::new("meta-data")
                .with_listing()
                .with_child("instance-id", Leaf::new(store.clone(), "ns", "uuid", Encoding::Raw))
                .with_child(
                    "region",
                    Leaf::new(store.clone(), "ns", "region", Encoding::Json).read_only(),
                )
                .with_child("placement", Container::new("placement")),
        )
    }

    #[test]
    fn test_dispatch_to_leaf() {
        let store = store();
        store.set("ns", "uuid", DATA_FIELD, "i-1234").unwrap();
        let root = tree(&store);

        let value = root
            .dispatch(&Request::get(), &["meta-data", "instance-id"])
            .unwrap();
        assert_eq!(value, Value::Text("i-1234".to_string()));
    }

    #[test]
    fn test_dispatch_through_alias() {
        let store = store();
        store.set("ns", "uuid", DATA_FIELD, "i-1234").unwrap();
        let root = tree(&store);

        let value = root
            .dispatch(&Request::get(), &["meta_data", "instance_id"])
            .unwrap();
        assert_eq!(value.as_text(), Some("i-1234"));
    }

    #[test]
    fn test_absent_leaf_is_empty() {
        let root = tree(&store());
        let value = root
            .dispatch(&Request::get(), &["meta-data", "instance-id"])
            .unwrap();
        assert_eq!(value, Value::Empty);
    }

    #[test]
    fn test_container_without_listing() {
        let root = tree(&store());
        assert_eq!(
            root.dispatch(&Request::get(), &[]).unwrap_err(),
            MetadataError::NotAResource("root".to_string())
        );
        assert_eq!(
            root.dispatch(&Request::get(), &["meta-data", "placement"])
                .unwrap_err(),
            MetadataError::NotAResource("placement".to_string())
        );
    }

    #[test]
    fn test_container_listing() {
        let root = tree(&store());
        let value = root.dispatch(&Request::get(), &["meta-data"]).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                "instance-id".to_string(),
                "region".to_string(),
                "placement/".to_string(),
            ])
        );
        assert_eq!(
            root.dispatch(&Request::set("x"), &["meta-data"]).unwrap_err(),
            MetadataError::MethodNotAllowed(Method::Set)
        );
    }

    #[test]
    fn test_unknown_segment() {
        let root = tree(&store());
        assert_eq!(
            root.dispatch(&Request::get(), &["meta-data", "nope"])
                .unwrap_err(),
            MetadataError::UnknownResource("nope".to_string())
        );
    }

    #[test]
    fn test_leaf_rejects_trailing_segments() {
        let root = tree(&store());
        assert_eq!(
            root.dispatch(&Request::get(), &["meta-data", "instance-id", "extra"])
                .unwrap_err(),
            MetadataError::UnknownResource("extra".to_string())
        );
    }

    #[test]
    fn test_set_then_get() {
        let store = store();
        let root = tree(&store);

        let stored = root
            .dispatch(&Request::set("i-9999"), &["meta-data", "instance-id"])
            .unwrap();
        assert_eq!(stored, Value::Empty);
        assert_eq!(store.get("ns", "uuid", DATA_FIELD).unwrap(), "i-9999");
    }

    #[test]
    fn test_set_on_read_only_leaf() {
        let root = tree(&store());
        assert_eq!(
            root.dispatch(&Request::set("\"nyc3\""), &["meta-data", "region"])
                .unwrap_err(),
            MetadataError::MethodNotAllowed(Method::Set)
        );
    }

    #[test]
    fn test_set_validates_encoding() {
        let store = store();
        let leaf = Leaf::new(store.clone(), "ns", "region", Encoding::Json);

        let err = leaf.dispatch(&Request::set("nyc3"), &[]).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidValue(_)));
        assert!(store.get("ns", "region", DATA_FIELD).unwrap_err().is_not_found());

        let request = Request {
            method: Method::Set,
            body: None,
        };
        assert!(matches!(
            leaf.dispatch(&request, &[]).unwrap_err(),
            MetadataError::InvalidValue(_)
        ));
    }

    #[test]
    fn test_composite_all_absent() {
        let store = store();
        let composite = CompositeLeaf::new()
            .with_field("id", Leaf::new(store.clone(), "ns", "uuid", Encoding::Json))
            .with_field("user_data", Leaf::new(store.clone(), "ns", "user_data", Encoding::Base64));

        let value = composite.dispatch(&Request::get(), &[]).unwrap();
        assert_eq!(value, Value::Json(json!({"id": null, "user_data": null})));
    }

    #[test]
    fn test_composite_partial() {
        let store = store();
        store.set("ns", "uuid", DATA_FIELD, "12345").unwrap();
        store.set("ns", "hostname", DATA_FIELD, "{broken").unwrap();
        let composite = CompositeLeaf::new()
            .with_field("id", Leaf::new(store.clone(), "ns", "uuid", Encoding::Json))
            .with_field("hostname", Leaf::new(store.clone(), "ns", "hostname", Encoding::Json));

        let value = composite.dispatch(&Request::get(), &[]).unwrap();
        assert_eq!(value, Value::Json(json!({"id": 12345, "hostname": null})));
    }

    #[test]
    fn test_composite_keeps_present_empty_values() {
        let store = store();
        store.set("ns", "hostname", DATA_FIELD, "\"\"").unwrap();
        store.set("ns", "public_keys", DATA_FIELD, "[]").unwrap();
        store.set("ns", "user_data", DATA_FIELD, "").unwrap();
        store.set("ns", "region", DATA_FIELD, "null").unwrap();
        let composite = CompositeLeaf::new()
            .with_field("hostname", Leaf::new(store.clone(), "ns", "hostname", Encoding::Json))
            .with_field("public_keys", Leaf::new(store.clone(), "ns", "public_keys", Encoding::Json))
            .with_field("user_data", Leaf::new(store.clone(), "ns", "user_data", Encoding::Base64))
            .with_field("region", Leaf::new(store.clone(), "ns", "region", Encoding::Json));

        let value = composite.dispatch(&Request::get(), &[]).unwrap();
        assert_eq!(
            value,
            Value::Json(json!({
                "hostname": "",
                "public_keys": [],
                "user_data": "",
                "region": null,
            }))
        );
    }

    #[test]
    fn test_composite_is_read_only() {
        let composite = CompositeLeaf::new();
        assert_eq!(
            composite.dispatch(&Request::set("{}"), &[]).unwrap_err(),
            MetadataError::MethodNotAllowed(Method::Set)
        );
    }
}
