//! # Push Service Configuration
//!
//! YAML-based configuration with environment overrides, loaded through the
//! `config` crate by [`ConfigManager`].
//!
//! ## Layout
//!
//! ```yaml
//! service_name: Push.Service.FcmPushService
//! access_key: process-wide-default-key
//! reconcile_transient_failures: true
//! attributes:
//!   OK: https://cdn.example.com/push/ok.png
//!   DeleteToken: Push.Service.TokenStore
//!   AndroidConfig:
//!     Priority: High
//!     TimeToLive: "28 00:00:00"
//! ```
//!
//! Nested attribute tables are flattened into dotted keys, so the example
//! above exposes `AndroidConfig.Priority` through
//! [`AttributeResolver`](attributes::AttributeResolver).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fcm_dispatch::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load_from_directory_with_env(Some("config".into()), "test")?;
//! let resolver = manager.attribute_resolver();
//! # let _ = resolver;
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::DEFAULT_SERVICE_NAME;

pub use attributes::{AttributeError, AttributeResolver, ConfigAttributeResolver};
pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring push-service.yaml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Identifier requests must carry to be accepted by this service
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Process-wide default key used when `AesDecryptorKey` is unset
    #[serde(default)]
    pub access_key: Option<String>,

    /// Delete tokens for every failed message, including transient failures
    #[serde(default = "default_reconcile_transient_failures")]
    pub reconcile_transient_failures: bool,

    /// Attribute tree exposed to the service as dotted keys
    #[serde(default)]
    pub attributes: HashMap<String, AttributeNode>,
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_reconcile_transient_failures() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            access_key: None,
            reconcile_transient_failures: default_reconcile_transient_failures(),
            attributes: HashMap::new(),
        }
    }
}

/// One node of the attribute tree: a scalar or a nested table
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AttributeNode {
    Text(String),
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Table(HashMap<String, AttributeNode>),
}

impl ServiceConfig {
    /// Validate the loaded configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigurationError::MissingRequiredField {
                field: "service_name".to_string(),
                context: "push service configuration".to_string(),
            });
        }

        if let Some(access_key) = &self.access_key {
            if access_key.trim().is_empty() {
                return Err(ConfigurationError::InvalidValue {
                    field: "access_key".to_string(),
                    value: access_key.clone(),
                    context: "must be omitted or non-empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Flatten the attribute tree into dotted keys
    pub fn attribute_map(&self) -> HashMap<String, String> {
        let mut flattened = HashMap::new();
        for (key, node) in &self.attributes {
            flatten_node(key, node, &mut flattened);
        }
        flattened
    }

    /// Build an attribute resolver over this configuration
    pub fn attribute_resolver(&self) -> ConfigAttributeResolver {
        ConfigAttributeResolver::new(self.attribute_map())
    }
}

fn flatten_node(prefix: &str, node: &AttributeNode, out: &mut HashMap<String, String>) {
    match node {
        AttributeNode::Text(value) => {
            out.insert(prefix.to_string(), value.clone());
        }
        AttributeNode::Boolean(value) => {
            out.insert(prefix.to_string(), value.to_string());
        }
        AttributeNode::Integer(value) => {
            out.insert(prefix.to_string(), value.to_string());
        }
        AttributeNode::Float(value) => {
            out.insert(prefix.to_string(), value.to_string());
        }
        AttributeNode::Table(children) => {
            for (key, child) in children {
                flatten_node(&format!("{prefix}.{key}"), child, out);
            }
        }
    }
}
