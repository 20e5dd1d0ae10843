//! DigitalOcean style metadata tree
//!
//! ```text
//! /
//! └── metadata
//!     ├── v1/            listing
//!     │   ├── id
//!     │   ├── hostname
//!     │   ├── user-data  base64 decoded
//!     │   ├── vendor-data
//!     │   ├── public-keys
//!     │   └── region
//!     └── v1_json        whole document (`v1.json` on the wire)
//! ```
//!
//! Every value except user data is stored JSON encoded.

use crate::node::{CompositeLeaf, Container, Leaf};
use crate::store::KeyedStore;
use crate::types::Encoding;
use std::sync::Arc;

/// Store namespace of the DigitalOcean tree
pub const NAMESPACE: &str = "digitalocean";

/// Store key names, paired with the name they are served under
const RESOURCES: [(&str, &str, Encoding); 6] = [
    ("id", "uuid", Encoding::Json),
    ("hostname", "hostname", Encoding::Json),
    ("user-data", "user_data", Encoding::Base64),
    ("vendor-data", "vendor_data", Encoding::Json),
    ("public-keys", "public_keys", Encoding::Json),
    ("region", "region", Encoding::Json),
];

/// Build the DigitalOcean tree over `store`
pub fn tree(store: Arc<dyn KeyedStore>) -> Container {
    let leaf = |name: &str, encoding| Leaf::new(store.clone(), NAMESPACE, name, encoding);

    let mut v1 = Container::new("v1").with_listing();
    let mut document = CompositeLeaf::new();
    for (segment, name, encoding) in RESOURCES {
        v1 = v1.with_child(segment, leaf(name, encoding));
        document = document.with_field(segment.replace('-', "_"), leaf(name, encoding));
    }

    Container::new("digitalocean").with_child(
        "metadata",
        Container::new("metadata")
            .with_child("v1", v1)
            .with_child("v1_json", document),
    )
}
