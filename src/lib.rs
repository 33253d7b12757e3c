#![allow(clippy::doc_markdown)] // Allow technical terms like FCM, JSON in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # FCM Dispatch Core
//!
//! Push notification dispatch for a record-oriented service framework.
//!
//! ## Overview
//!
//! Requests arrive as generic command records: named commands holding ordered
//! rows of named field values. The push service turns each row into a push
//! message, sends the whole batch through a push gateway on a background task,
//! and deletes the tokens of messages the gateway reports as undeliverable by
//! dispatching a follow-up command to a token store service by name.
//!
//! ## Architecture
//!
//! ```text
//! ServiceRegistry ──► PushService::submit(ServiceRequest)
//!                        │  check service name
//!                        │  MessageBuilder::build       (all-or-nothing)
//!                        ▼
//!                   DispatchCoordinator::dispatch ──► tokio::spawn
//!                                                        │
//!                                   PushGateway::send_all ──► BatchResult
//!                                                        │
//!                                   TokenReconciler ──► ServiceDispatcher("DeleteToken")
//! ```
//!
//! The caller's response only says the batch was accepted. Delivery results
//! and reconciliation are logged, never returned.
//!
//! ## Module Organization
//!
//! - [`records`] - Generic command/row envelope and status responses
//! - [`config`] - Configuration loading and attribute resolution
//! - [`messaging`] - Push message model, batch outcomes and the gateway seam
//! - [`credentials`] - Gateway credential resolution
//! - [`dispatch`] - Message building, background dispatch and token reconciliation
//! - [`registry`] - Name-based service dispatch
//! - [`service`] - The push service request boundary
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fcm_dispatch::config::ConfigManager;
//! use fcm_dispatch::messaging::PushGateway;
//! use fcm_dispatch::registry::{ServiceDispatcher, ServiceRegistry};
//! use fcm_dispatch::PushService;
//!
//! # async fn example(gateway: Arc<dyn PushGateway>) -> Result<(), Box<dyn std::error::Error>> {
//! fcm_dispatch::logging::init_structured_logging();
//!
//! let manager = ConfigManager::load()?;
//! let registry = Arc::new(ServiceRegistry::new());
//! let service = PushService::new(
//!     manager.config(),
//!     Arc::new(manager.attribute_resolver()),
//!     gateway,
//!     registry.clone(),
//! );
//! registry.register_handler(Arc::new(service)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```

pub mod config;
pub mod constants;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod records;
pub mod registry;
pub mod service;

pub use config::{AttributeResolver, ConfigManager, ServiceConfig};
pub use credentials::{GatewayCredential, KeyMaterial, SecretDecryptor};
pub use dispatch::{BatchOutcome, DispatchCoordinator, MessageBuilder, ReconcileOutcome, TokenReconciler};
pub use error::{PushError, Result};
pub use messaging::{BatchResult, GatewaySlot, PushGateway, PushMessage};
pub use records::{Command, CommandRecordSet, Response, Row, ServiceRequest, Status};
pub use registry::{ServiceDispatcher, ServiceHandler, ServiceRegistry};
pub use service::{PushService, Submission};
