//! # Gateway Credentials
//!
//! The gateway credential is stored encrypted in the `GoogleCredential`
//! attribute. Key and IV come from `AesDecryptorKey` / `AesDecryptorKeyIV`,
//! falling back to the process-wide access key and [`DEFAULT_CREDENTIAL_IV`].
//! Decryption itself is performed by a host-supplied [`SecretDecryptor`].

use std::fmt;
use tracing::{debug, warn};

use crate::config::AttributeResolver;
use crate::constants::{attributes, DEFAULT_CREDENTIAL_IV, MIN_CREDENTIAL_KEY_LEN};
use crate::error::{PushError, Result};

/// Decrypts stored secrets
pub trait SecretDecryptor: Send + Sync {
    /// Decrypt a base64 ciphertext with the given key and IV
    fn decrypt(&self, ciphertext: &str, key: &str, iv: &str) -> Result<String>;
}

/// Decrypted gateway credential (service account JSON)
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayCredential(String);

impl GatewayCredential {
    pub fn new(json: impl Into<String>) -> Self {
        Self(json.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for GatewayCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GatewayCredential([REDACTED; {} bytes])", self.0.len())
    }
}

/// Where the decryption key was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The `AesDecryptorKey` attribute
    Attribute,
    /// The process-wide access key
    AccessKey,
    None,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Attribute => f.write_str(attributes::AES_DECRYPTOR_KEY),
            KeySource::AccessKey => f.write_str("access_key"),
            KeySource::None => f.write_str("none"),
        }
    }
}

/// Key and IV used to decrypt the gateway credential
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    key: String,
    iv: String,
    source: KeySource,
}

impl KeyMaterial {
    /// Resolve key and IV, applying the access key and default IV fallbacks
    pub fn resolve(resolver: &dyn AttributeResolver, access_key: Option<&str>) -> Self {
        let configured = resolver.attribute_or_empty(attributes::AES_DECRYPTOR_KEY);
        let (key, source) = if !configured.is_empty() {
            (configured, KeySource::Attribute)
        } else if let Some(access_key) = access_key.filter(|k| !k.is_empty()) {
            (access_key.to_string(), KeySource::AccessKey)
        } else {
            (String::new(), KeySource::None)
        };

        let mut iv = resolver.attribute_or_empty(attributes::AES_DECRYPTOR_KEY_IV);
        if iv.is_empty() {
            iv = DEFAULT_CREDENTIAL_IV.to_string();
        }

        Self { key, iv, source }
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    /// Both key and IV are at least [`MIN_CREDENTIAL_KEY_LEN`] bytes
    pub fn is_usable(&self) -> bool {
        self.key.len() >= MIN_CREDENTIAL_KEY_LEN && self.iv.len() >= MIN_CREDENTIAL_KEY_LEN
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_len", &self.key.len())
            .field("iv_len", &self.iv.len())
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve and decrypt the gateway credential
///
/// Yields an empty credential when the key material is not usable;
/// decryption is not attempted in that case.
pub fn resolve_gateway_credential(
    resolver: &dyn AttributeResolver,
    access_key: Option<&str>,
    decryptor: &dyn SecretDecryptor,
) -> Result<GatewayCredential> {
    let material = KeyMaterial::resolve(resolver, access_key);
    if !material.is_usable() {
        warn!(
            key_len = material.key.len(),
            iv_len = material.iv.len(),
            key_source = %material.source,
            "Credential key material too short, gateway credential unavailable"
        );
        return Ok(GatewayCredential::new(""));
    }

    let ciphertext = resolver.attribute_or_empty(attributes::GOOGLE_CREDENTIAL);
    let credential = decryptor.decrypt(&ciphertext, &material.key, &material.iv)?;
    debug!(bytes = credential.len(), "Gateway credential decrypted");

    Ok(GatewayCredential::new(credential))
}

/// Reject an empty credential before gateway initialization
pub fn require_credential(credential: &GatewayCredential) -> Result<()> {
    if credential.is_empty() {
        return Err(PushError::Credential(
            "gateway credential is empty; check AesDecryptorKey, AesDecryptorKeyIV and GoogleCredential"
                .to_string(),
        ));
    }
    Ok(())
}
