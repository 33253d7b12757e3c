//! Service registry for name-based request dispatch

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::records::{Response, ServiceRequest};

/// A service reachable by name
#[async_trait]
pub trait ServiceHandler: Send + Sync {
    /// Handle a request and produce a status envelope
    async fn handle(&self, request: ServiceRequest) -> Response;

    /// Name the handler registers under
    fn service_name(&self) -> &str;
}

/// Executes requests against services resolved by name
#[async_trait]
pub trait ServiceDispatcher: Send + Sync {
    async fn execute(
        &self,
        service_name: &str,
        request: ServiceRequest,
    ) -> Result<Response, DispatchError>;
}

/// Central registry of service handlers
///
/// Handlers are registered at process start and looked up per request.
/// Execution history is kept for debugging when enabled.
pub struct ServiceRegistry {
    /// Registered handlers by service name
    handlers: Arc<RwLock<HashMap<String, Arc<dyn ServiceHandler>>>>,

    /// Bounded execution history
    history: Arc<RwLock<Vec<ServiceExecution>>>,

    config: ServiceRegistryConfig,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::with_config(ServiceRegistryConfig::default())
    }

    pub fn with_config(config: ServiceRegistryConfig) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            history: Arc::new(RwLock::new(Vec::new())),
            config,
        }
    }

    /// Register a handler under its own service name
    pub async fn register_handler(
        &self,
        handler: Arc<dyn ServiceHandler>,
    ) -> Result<(), DispatchError> {
        let name = handler.service_name().to_string();
        self.register_handler_as(name, handler).await
    }

    /// Register a handler under an explicit service name
    pub async fn register_handler_as(
        &self,
        service_name: impl Into<String>,
        handler: Arc<dyn ServiceHandler>,
    ) -> Result<(), DispatchError> {
        let service_name = service_name.into();
        if service_name.trim().is_empty() {
            return Err(DispatchError::RegistrationFailed {
                reason: "Service name cannot be empty".to_string(),
            });
        }

        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(&service_name) {
            warn!(service_name = %service_name, "Replacing existing service handler");
        }
        handlers.insert(service_name.clone(), handler);
        info!(service_name = %service_name, "Registered service handler");

        Ok(())
    }

    pub async fn unregister_handler(&self, service_name: &str) -> bool {
        let removed = self.handlers.write().await.remove(service_name).is_some();
        if removed {
            info!(service_name = %service_name, "Unregistered service handler");
        } else {
            warn!(
                service_name = %service_name,
                "Attempted to unregister non-existent handler"
            );
        }
        removed
    }

    pub async fn has_handler(&self, service_name: &str) -> bool {
        self.handlers.read().await.contains_key(service_name)
    }

    pub async fn registered_services(&self) -> Vec<String> {
        self.handlers.read().await.keys().cloned().collect()
    }

    pub async fn get_history(&self) -> Vec<ServiceExecution> {
        self.history.read().await.clone()
    }

    pub async fn clear_history(&self) {
        self.history.write().await.clear();
    }

    pub async fn get_stats(&self) -> ServiceRegistryStats {
        let handlers = self.handlers.read().await;
        let history = self.history.read().await;
        let successful = history.iter().filter(|e| e.response.is_ok()).count();

        ServiceRegistryStats {
            registered_handlers: handlers.len(),
            total_executions: history.len(),
            successful_executions: successful,
            failed_executions: history.len() - successful,
            history_enabled: self.config.enable_history,
        }
    }

    async fn record(&self, service_name: &str, response: &Response, execution_time_ms: u64) {
        if !self.config.enable_history {
            return;
        }

        let mut history = self.history.write().await;
        history.push(ServiceExecution {
            service_name: service_name.to_string(),
            response: response.clone(),
            execution_time_ms,
            timestamp: chrono::Utc::now(),
        });

        if history.len() > self.config.max_history_size {
            let excess = history.len() - self.config.max_history_size;
            history.drain(0..excess);
        }
    }
}

#[async_trait]
impl ServiceDispatcher for ServiceRegistry {
    async fn execute(
        &self,
        service_name: &str,
        request: ServiceRequest,
    ) -> Result<Response, DispatchError> {
        if service_name.trim().is_empty() {
            return Err(DispatchError::InvalidRequest {
                reason: "Service name cannot be empty".to_string(),
            });
        }

        let handler = self
            .handlers
            .read()
            .await
            .get(service_name)
            .cloned()
            .ok_or_else(|| DispatchError::HandlerNotFound {
                service_name: service_name.to_string(),
            })?;

        debug!(
            service_name = %service_name,
            commands = request.commands.len(),
            rows = request.commands.total_rows(),
            "Dispatching service request"
        );

        let started = std::time::Instant::now();
        let response = handler.handle(request).await;
        let execution_time_ms = started.elapsed().as_millis() as u64;

        if response.is_ok() {
            debug!(
                service_name = %service_name,
                execution_time_ms,
                "Service request completed"
            );
        } else {
            warn!(
                service_name = %service_name,
                execution_time_ms,
                message = response.message.as_deref().unwrap_or(""),
                "Service request returned error status"
            );
        }

        self.record(service_name, &response, execution_time_ms).await;
        Ok(response)
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ServiceRegistryConfig {
    pub enable_history: bool,
    pub max_history_size: usize,
}

impl Default for ServiceRegistryConfig {
    fn default() -> Self {
        Self {
            enable_history: true,
            max_history_size: 1000,
        }
    }
}

/// One dispatched request, for history tracking
#[derive(Debug, Clone)]
pub struct ServiceExecution {
    pub service_name: String,
    pub response: Response,
    pub execution_time_ms: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct ServiceRegistryStats {
    pub registered_handlers: usize,
    pub total_executions: usize,
    pub successful_executions: usize,
    pub failed_executions: usize,
    pub history_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("Handler not found for service: {service_name}")]
    HandlerNotFound { service_name: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Handler registration failed: {reason}")]
    RegistrationFailed { reason: String },
}
