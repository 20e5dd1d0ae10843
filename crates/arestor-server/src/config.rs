//! Server configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty file (or
//! no file at all) yields a server mounting both providers on
//! `127.0.0.1:8080`.
//!
//! ```toml
//! listen = "0.0.0.0:80"
//! default_provider = "ec2"
//!
//! [providers]
//! ec2 = "ec2"
//! digitalocean = "digitalocean"
//!
//! [seed.ec2]
//! uuid = "i-1234"
//! public_keys = ["ssh-ed25519 AAAA... user@host"]
//! ```

use arestor_metadata::{DATA_FIELD, KeyedStore, Provider};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but is inconsistent
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Metadata server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub listen: SocketAddr,

    /// Provider also served at `/`, without its mount prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<Provider>,

    /// Mounted providers (by name) and their path prefix
    pub providers: BTreeMap<String, String>,

    /// Initial store contents: namespace -> name -> value
    ///
    /// Strings are stored as given; any other TOML value is stored as its
    /// JSON encoding.
    pub seed: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            default_provider: None,
            providers: Provider::ALL
                .into_iter()
                .map(|p| (p.to_string(), p.namespace().to_string()))
                .collect(),
            seed: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate config text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the listen address
    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    /// Serve `provider` at `/` as well
    pub fn with_default_provider(mut self, provider: Provider) -> Self {
        self.default_provider = Some(provider);
        self
    }

    /// Mount `provider` under `prefix`
    pub fn with_mount(mut self, provider: Provider, prefix: impl Into<String>) -> Self {
        self.providers.insert(provider.to_string(), prefix.into());
        self
    }

    /// Add a seed value
    pub fn with_seed(
        mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.seed
            .entry(namespace.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    /// Get the mounted providers with their path prefix
    pub fn mounts(&self) -> Result<Vec<(Provider, &str)>, ConfigError> {
        let mut mounts = Vec::with_capacity(self.providers.len());
        let mut seen = HashSet::new();
        for (name, prefix) in &self.providers {
            let provider: Provider = name.parse().map_err(ConfigError::Invalid)?;
            if prefix.is_empty() || prefix.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "mount for {} must be a single non-empty path segment, got {:?}",
                    provider, prefix
                )));
            }
            if !seen.insert(prefix.as_str()) {
                return Err(ConfigError::Invalid(format!("mount {:?} used twice", prefix)));
            }
            mounts.push((provider, prefix.as_str()));
        }
        Ok(mounts)
    }

    /// Check the config for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mounts = self.mounts()?;

        if let Some(provider) = self.default_provider {
            if !mounts.iter().any(|(mounted, _)| *mounted == provider) {
                return Err(ConfigError::Invalid(format!(
                    "default provider {} is not mounted",
                    provider
                )));
            }
        }

        if let Some(namespace) = self.seed.keys().find(|ns| ns.is_empty()) {
            return Err(ConfigError::Invalid(format!("empty seed namespace {:?}", namespace)));
        }

        Ok(())
    }

    /// Write the seed values into `store`
    ///
    /// Returns the number of values written.
    pub fn seed_into(&self, store: &dyn KeyedStore) -> arestor_metadata::Result<usize> {
        let mut written = 0;
        for (namespace, values) in &self.seed {
            for (name, value) in values {
                let raw = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                store.set(namespace, name, DATA_FIELD, &raw)?;
                written += 1;
            }
        }
        Ok(written)
    }
}
