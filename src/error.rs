//! Error types for the push dispatch service.

use crate::config::{AttributeError, ConfigurationError};
use crate::messaging::GatewayError;
use crate::registry::DispatchError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PushError {
    #[error("Not {expected}")]
    ServiceNameMismatch {
        expected: String,
        actual: Option<String>,
    },
    #[error("Invalid data payload in command '{command}' row {row}: {reason}")]
    InvalidPayload {
        command: String,
        row: usize,
        reason: String,
    },
    #[error("Attribute error: {0}")]
    Attribute(#[from] AttributeError),
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<ConfigurationError> for PushError {
    fn from(error: ConfigurationError) -> Self {
        PushError::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PushError>;
