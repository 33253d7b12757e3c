//! # Push Message Structures
//!
//! One [`PushMessage`] is built per request row. Serialization follows the
//! gateway's message shape (`token`, `notification`, `data`, `android`).

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::platform::AndroidConfig;

/// Visible part of a push message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "image", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Message addressed to a single device token
///
/// Token, title and body are carried as supplied by the request row, absent
/// values included; the gateway decides what it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub notification: Notification,
    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub data_payload: Option<HashMap<String, String>>,
    #[serde(rename = "android")]
    pub platform_config: Arc<AndroidConfig>,
}

impl PushMessage {
    pub fn new(token: Option<String>, platform_config: Arc<AndroidConfig>) -> Self {
        Self {
            token,
            notification: Notification::default(),
            data_payload: None,
            platform_config,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.notification.title = title;
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.notification.body = body;
        self
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.notification.image_url = image_url;
        self
    }

    pub fn with_data(mut self, data: Option<HashMap<String, String>>) -> Self {
        self.data_payload = data;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.notification.image_url.as_deref()
    }
}
