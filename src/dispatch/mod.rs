//! # Push Dispatch
//!
//! The request-to-gateway path:
//!
//! ```text
//! CommandRecordSet ──► MessageBuilder ──► Vec<PushMessage>
//!                                              │
//!                        DispatchCoordinator ◄─┘ (spawned task)
//!                              │
//!                         PushGateway::send_all ──► BatchResult
//!                              │ failures > 0
//!                         TokenReconciler ──► ServiceDispatcher("DeleteToken")
//! ```
//!
//! Building is synchronous and all-or-nothing. Everything from the gateway
//! call onward runs detached from the request.

pub mod builder;
pub mod coordinator;
pub mod reconciler;

pub use builder::{parse_data_payload, MessageBuilder};
pub use coordinator::{BatchOutcome, DispatchCoordinator};
pub use reconciler::{ReconcileOutcome, ReconciliationPolicy, TokenReconciler};
