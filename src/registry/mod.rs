//! # Service Registry
//!
//! Name-based service dispatch. Handlers register under a service name at
//! process start; callers execute a [`ServiceRequest`](crate::records::ServiceRequest)
//! against a name without knowing the concrete handler.
//!
//! ```text
//! ServiceRegistry
//! ├── register_handler("Push.Service.TokenStore", handler)
//! └── execute("Push.Service.TokenStore", request) -> Response
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fcm_dispatch::records::ServiceRequest;
//! use fcm_dispatch::registry::{ServiceDispatcher, ServiceRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ServiceRegistry::new();
//! // registry.register_handler(handler).await?;
//! let response = registry
//!     .execute("Push.Service.TokenStore", ServiceRequest::new("Push.Service.TokenStore"))
//!     .await;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod service_registry;

pub use service_registry::{
    DispatchError, ServiceDispatcher, ServiceExecution, ServiceHandler, ServiceRegistry,
    ServiceRegistryConfig, ServiceRegistryStats,
};
