//! Metadata service
//!
//! Binds one provider tree to a store and resolves request paths against it.
//!
//! Paths are split the way the mocked providers' HTTP front ends split them:
//! empty segments are dropped, each segment is percent-decoded and `.`
//! becomes `_`, so `metadata/v1.json` reaches the `v1_json` resource.

use crate::error::Result;
use crate::node::{Container, ResourceNode};
use crate::providers::Provider;
use crate::store::KeyedStore;
use crate::types::{Request, Value};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// Split a request path into dispatch segments
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            // Segments that do not decode to UTF-8 are kept as sent
            let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
            decoded.replace('.', "_")
        })
        .collect()
}

/// Metadata service for one provider
#[derive(Debug)]
pub struct MetadataService {
    provider: Provider,
    root: Container,
}

impl MetadataService {
    /// Create a service serving `provider` from `store`
    pub fn new(provider: Provider, store: Arc<dyn KeyedStore>) -> Self {
        Self {
            provider,
            root: provider.tree(store),
        }
    }

    /// Get the provider
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Get the root of the provider tree
    pub fn root(&self) -> &Container {
        &self.root
    }

    /// Dispatch a request to already split segments
    pub fn dispatch<S: AsRef<str>>(&self, request: &Request<'_>, segments: &[S]) -> Result<Value> {
        let segments: Vec<&str> = segments.iter().map(|s| s.as_ref()).collect();
        debug!(
            provider = %self.provider,
            method = %request.method,
            path = %segments.join("/"),
            "dispatching metadata request"
        );
        self.root.dispatch(request, &segments)
    }

    /// Resolve a metadata path to its value
    pub fn resolve(&self, path: &str) -> Result<Value> {
        self.dispatch(&Request::get(), &split_path(path))
    }

    /// Store `body` as the new raw value of the resource at `path`
    pub fn update(&self, path: &str, body: &str) -> Result<()> {
        self.dispatch(&Request::set(body), &split_path(path))
            .map(|_| ())
    }
}
