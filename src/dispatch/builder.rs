//! # Message Builder
//!
//! Converts request rows into [`PushMessage`]s, one per row, in command
//! insertion order then row order.
//!
//! Image URLs and data payloads fail differently. An image alias that cannot
//! be resolved only drops the image from that row. A malformed `Data` payload
//! aborts the whole build, so a partially built batch is never sent.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::AttributeResolver;
use crate::constants::{fields, DEFAULT_IMAGE_ALIAS};
use crate::error::{PushError, Result};
use crate::messaging::{AndroidConfig, PushMessage};
use crate::records::{CommandRecordSet, Row};

pub struct MessageBuilder {
    attributes: Arc<dyn AttributeResolver>,
    platform_config: Arc<AndroidConfig>,
}

impl MessageBuilder {
    pub fn new(attributes: Arc<dyn AttributeResolver>, platform_config: Arc<AndroidConfig>) -> Self {
        Self {
            attributes,
            platform_config,
        }
    }

    pub fn platform_config(&self) -> &Arc<AndroidConfig> {
        &self.platform_config
    }

    /// Build every message of the record set, or none at all
    pub fn build(&self, records: &CommandRecordSet) -> Result<Vec<PushMessage>> {
        let mut messages = Vec::with_capacity(records.total_rows());

        for (command_key, command) in records.iter() {
            for (row_index, row) in command.rows.iter().enumerate() {
                messages.push(self.build_message(command_key, row_index, row)?);
            }
        }

        debug!(
            commands = records.len(),
            messages = messages.len(),
            "Built push messages"
        );
        Ok(messages)
    }

    fn build_message(&self, command_key: &str, row_index: usize, row: &Row) -> Result<PushMessage> {
        let data = parse_data_payload(row.text(fields::DATA)).map_err(|e| {
            PushError::InvalidPayload {
                command: command_key.to_string(),
                row: row_index,
                reason: e.to_string(),
            }
        })?;

        Ok(
            PushMessage::new(owned(row.text(fields::TOKEN)), self.platform_config.clone())
                .with_title(owned(row.text(fields::TITLE)))
                .with_body(owned(row.text(fields::BODY)))
                .with_image_url(self.resolve_image_url(row.text(fields::IMAGE_URL)))
                .with_data(data),
        )
    }

    /// Resolve a row's `ImageUrl` value
    ///
    /// Empty or absent means the default alias. Absolute URIs pass through;
    /// anything else is an attribute key. Resolution failures yield `None`.
    pub fn resolve_image_url(&self, raw: Option<&str>) -> Option<String> {
        let value = match raw {
            Some(value) if !value.is_empty() => value,
            _ => DEFAULT_IMAGE_ALIAS,
        };

        if is_absolute_uri(value) {
            return Some(value.to_string());
        }

        match self.attributes.get_attribute(value) {
            Ok(resolved) if !resolved.is_empty() => Some(resolved),
            Ok(_) => {
                debug!(alias = %value, "Image alias resolved to an empty value");
                None
            }
            Err(e) => {
                warn!(alias = %value, error = %e, "Image alias could not be resolved, sending without image");
                None
            }
        }
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

/// Only host-bearing URLs pass through; `scheme:rest` strings are aliases
fn is_absolute_uri(value: &str) -> bool {
    url::Url::parse(value).is_ok_and(|url| url.has_host())
}

/// Parse a row's `Data` field as a JSON object of string values
///
/// Empty or absent input means no payload; so does a JSON `null`.
pub fn parse_data_payload(
    raw: Option<&str>,
) -> std::result::Result<Option<HashMap<String, String>>, serde_json::Error> {
    match raw {
        None | Some("") => Ok(None),
        Some(json) => serde_json::from_str::<Option<HashMap<String, String>>>(json),
    }
}
