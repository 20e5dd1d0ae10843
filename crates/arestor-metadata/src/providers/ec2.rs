//! EC2 style metadata tree
//!
//! ```text
//! /                           listing
//! ├── 2009-04-04/             listing (also registered as `latest`)
//! │   ├── meta-data/          listing
//! │   │   ├── public-keys/    indexed key list
//! │   │   ├── local-hostname
//! │   │   ├── hostname
//! │   │   └── instance-id
//! │   └── user-data           base64 decoded
//! ```

use crate::node::{Container, Leaf, Node};
use crate::public_keys::IndexedListResource;
use crate::store::KeyedStore;
use crate::types::Encoding;
use std::sync::Arc;

/// Store namespace of the EC2 tree
pub const NAMESPACE: &str = "ec2";

/// Version segment served by the tree
pub const VERSION: &str = "2009-04-04";

/// Build the EC2 tree over `store`
pub fn tree(store: Arc<dyn KeyedStore>) -> Container {
    let text = |name: &str| Leaf::new(store.clone(), NAMESPACE, name, Encoding::Raw);

    let meta_data = Container::new("meta-data")
        .with_listing()
        .with_child(
            "public-keys",
            IndexedListResource::new(store.clone(), NAMESPACE, "public_keys"),
        )
        .with_child("local-hostname", text("hostname"))
        .with_child("hostname", text("hostname"))
        .with_child("instance-id", text("uuid"));

    let version: Node = Arc::new(
        Container::new(VERSION)
            .with_listing()
            .with_child("meta-data", meta_data)
            .with_child(
                "user-data",
                Leaf::new(store.clone(), NAMESPACE, "user_data", Encoding::Base64),
            ),
    );

    Container::new("ec2")
        .with_listing()
        .with_node(VERSION, version.clone())
        .with_node("latest", version)
}
