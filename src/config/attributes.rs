//! # Attribute Resolution
//!
//! Key/value lookup for configuration and secret material. The push service
//! reads every tunable (platform config, credential material, image URL
//! aliases, the deletion service name) through [`AttributeResolver`], so hosts
//! can back it with whatever attribute store they already have.

use std::collections::HashMap;
use thiserror::Error;

/// Failure to resolve a configuration attribute
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("Attribute not found: {0}")]
    Missing(String),
    #[error("Attribute '{key}' could not be resolved: {reason}")]
    Resolution { key: String, reason: String },
}

/// Resolves configuration attributes by key
pub trait AttributeResolver: Send + Sync {
    /// Resolve `key`, failing when it is unknown or cannot be produced
    fn get_attribute(&self, key: &str) -> Result<String, AttributeError>;

    /// Resolve `key`, treating any failure as an empty value
    fn attribute_or_empty(&self, key: &str) -> String {
        self.get_attribute(key).unwrap_or_default()
    }
}

/// Attribute resolver backed by the flattened `attributes` tree of
/// [`ServiceConfig`](super::ServiceConfig)
///
/// Keys are ASCII case-insensitive. The `config` loader lowercases every key
/// it reads from files and environment variables, so `DeleteToken` and
/// `AndroidConfig.Priority` are stored as `deletetoken` and
/// `androidconfig.priority`. Aliases that differ only by case name the same
/// attribute; the last one inserted wins.
#[derive(Debug, Clone, Default)]
pub struct ConfigAttributeResolver {
    attributes: HashMap<String, String>,
}

impl ConfigAttributeResolver {
    pub fn new(attributes: HashMap<String, String>) -> Self {
        attributes
            .into_iter()
            .fold(Self::default(), |resolver, (key, value)| {
                resolver.with_attribute(key, value)
            })
    }

    /// Builder-style insert, mostly useful for tests and embedding
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut key = key.into();
        key.make_ascii_lowercase();
        self.attributes.insert(key, value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl AttributeResolver for ConfigAttributeResolver {
    fn get_attribute(&self, key: &str) -> Result<String, AttributeError> {
        self.attributes
            .get(&key.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| AttributeError::Missing(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        let resolver = ConfigAttributeResolver::default().with_attribute("OK", "https://cdn/ok.png");
        assert_eq!(resolver.get_attribute("OK").unwrap(), "https://cdn/ok.png");
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let resolver =
            ConfigAttributeResolver::default().with_attribute("deletetoken", "Token.Delete");
        assert_eq!(resolver.get_attribute("DeleteToken").unwrap(), "Token.Delete");
        assert_eq!(resolver.get_attribute("DELETETOKEN").unwrap(), "Token.Delete");
    }

    #[test]
    fn test_loader_lowercased_keys_resolve() {
        let loaded = HashMap::from([
            ("deletetoken".to_string(), "Push.Service.TokenStore".to_string()),
            ("androidconfig.priority".to_string(), "High".to_string()),
        ]);
        let resolver = ConfigAttributeResolver::new(loaded);

        assert_eq!(
            resolver.get_attribute("DeleteToken").unwrap(),
            "Push.Service.TokenStore"
        );
        assert_eq!(resolver.get_attribute("AndroidConfig.Priority").unwrap(), "High");
    }

    #[test]
    fn test_aliases_differing_by_case_share_a_slot() {
        let resolver = ConfigAttributeResolver::default()
            .with_attribute("Promo", "https://cdn/first.png")
            .with_attribute("PROMO", "https://cdn/second.png");

        assert_eq!(resolver.len(), 1);
        assert_eq!(resolver.get_attribute("promo").unwrap(), "https://cdn/second.png");
    }

    #[test]
    fn test_missing_attribute() {
        let resolver = ConfigAttributeResolver::default();
        assert_eq!(
            resolver.get_attribute("Nope"),
            Err(AttributeError::Missing("Nope".to_string()))
        );
        assert_eq!(resolver.attribute_or_empty("Nope"), "");
    }
}
