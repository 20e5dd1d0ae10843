//! Provider trees
//!
//! Each provider is a fixed tree of resources reading from one store
//! namespace.

pub mod digitalocean;
pub mod ec2;

use crate::node::Container;
use crate::store::KeyedStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Supported metadata providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// EC2 compatible `2009-04-04/meta-data` hierarchy
    Ec2,

    /// DigitalOcean `metadata/v1` hierarchy
    DigitalOcean,
}

impl Provider {
    /// All providers, in a stable order
    pub const ALL: [Provider; 2] = [Provider::Ec2, Provider::DigitalOcean];

    /// Get the provider's store namespace
    pub fn namespace(&self) -> &'static str {
        match self {
            Provider::Ec2 => ec2::NAMESPACE,
            Provider::DigitalOcean => digitalocean::NAMESPACE,
        }
    }

    /// Build the provider's resource tree over `store`
    pub fn tree(&self, store: Arc<dyn KeyedStore>) -> Container {
        match self {
            Provider::Ec2 => ec2::tree(store),
            Provider::DigitalOcean => digitalocean::tree(store),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.namespace().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown provider: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces() {
        assert_eq!(Provider::Ec2.namespace(), "ec2");
        assert_eq!(Provider::DigitalOcean.namespace(), "digitalocean");
    }

    #[test]
    fn test_parse() {
        assert_eq!("ec2".parse::<Provider>().unwrap(), Provider::Ec2);
        assert_eq!("DigitalOcean".parse::<Provider>().unwrap(), Provider::DigitalOcean);
        assert!("openstack".parse::<Provider>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        for provider in Provider::ALL {
            let encoded = serde_json::to_string(&provider).unwrap();
            assert_eq!(encoded, format!("\"{}\"", provider));
        }
    }
}
