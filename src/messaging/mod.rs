//! # Messaging Module
//!
//! Push message model, per-message batch outcomes and the gateway seam the
//! dispatch path sends through.

pub mod batch;
pub mod gateway;
pub mod message;
pub mod platform;

pub use batch::{BatchResult, MessagingErrorCode, SendFailure, SendResponse};
pub use gateway::{default_gateway, GatewayError, GatewaySlot, PushGateway};
pub use message::{Notification, PushMessage};
pub use platform::{parse_time_to_live, AndroidConfig, Priority};
