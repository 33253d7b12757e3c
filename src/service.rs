//! # Push Service
//!
//! Request boundary of the push dispatch path. A [`PushService`] checks the
//! request's service name, builds one message per row and hands the batch to
//! the [`DispatchCoordinator`]. The response means "accepted for processing";
//! delivery outcomes never reach the caller.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{AttributeResolver, ServiceConfig};
use crate::credentials::{
    require_credential, resolve_gateway_credential, GatewayCredential, SecretDecryptor,
};
use crate::dispatch::{
    BatchOutcome, DispatchCoordinator, MessageBuilder, ReconciliationPolicy, TokenReconciler,
};
use crate::error::{PushError, Result};
use crate::logging::log_error;
use crate::messaging::{default_gateway, AndroidConfig, GatewaySlot, PushGateway};
use crate::records::{Response, ServiceRequest};
use crate::registry::{ServiceDispatcher, ServiceHandler};

/// Result of submitting a request
///
/// `background` is the detached batch task, present only when a batch was
/// actually sent. Dropping it does not cancel the send.
#[derive(Debug)]
pub struct Submission {
    pub response: Response,
    pub background: Option<JoinHandle<BatchOutcome>>,
}

pub struct PushService {
    service_name: String,
    builder: MessageBuilder,
    coordinator: DispatchCoordinator,
}

impl PushService {
    /// Assemble the service around an already initialized gateway
    ///
    /// Platform config is resolved here, once, and shared by every message
    /// this instance builds.
    pub fn new(
        config: &ServiceConfig,
        attributes: Arc<dyn AttributeResolver>,
        gateway: Arc<dyn PushGateway>,
        dispatcher: Arc<dyn ServiceDispatcher>,
    ) -> Self {
        let platform_config = Arc::new(AndroidConfig::resolve(attributes.as_ref()));
        info!(
            service_name = %config.service_name,
            priority = %platform_config.priority,
            ttl_secs = platform_config.time_to_live.as_secs(),
            gateway = gateway.gateway_name(),
            "Push service configured"
        );

        let reconciler = TokenReconciler::new(
            dispatcher,
            attributes.clone(),
            ReconciliationPolicy::from_config(config.reconcile_transient_failures),
        );

        Self {
            service_name: config.service_name.clone(),
            builder: MessageBuilder::new(attributes, platform_config),
            coordinator: DispatchCoordinator::new(gateway, Arc::new(reconciler)),
        }
    }

    /// Assemble the service around the process-wide gateway, initializing it
    /// on first use
    ///
    /// `connect` receives the decrypted credential and runs at most once per
    /// process.
    pub fn bootstrap<F>(
        config: &ServiceConfig,
        attributes: Arc<dyn AttributeResolver>,
        dispatcher: Arc<dyn ServiceDispatcher>,
        decryptor: &dyn SecretDecryptor,
        connect: F,
    ) -> Result<Self>
    where
        F: FnOnce(&GatewayCredential) -> Result<Arc<dyn PushGateway>>,
    {
        Self::bootstrap_in(default_gateway(), config, attributes, dispatcher, decryptor, connect)
    }

    /// Like [`bootstrap`](Self::bootstrap) with an explicit gateway slot
    pub fn bootstrap_in<F>(
        slot: &GatewaySlot,
        config: &ServiceConfig,
        attributes: Arc<dyn AttributeResolver>,
        dispatcher: Arc<dyn ServiceDispatcher>,
        decryptor: &dyn SecretDecryptor,
        connect: F,
    ) -> Result<Self>
    where
        F: FnOnce(&GatewayCredential) -> Result<Arc<dyn PushGateway>>,
    {
        let gateway = slot.get_or_try_init(|| {
            let credential = resolve_gateway_credential(
                attributes.as_ref(),
                config.access_key.as_deref(),
                decryptor,
            )?;
            require_credential(&credential)?;
            connect(&credential)
        })?;

        Ok(Self::new(config, attributes, gateway, dispatcher))
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn platform_config(&self) -> &Arc<AndroidConfig> {
        self.builder.platform_config()
    }

    /// Validate, build and dispatch a request
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: ServiceRequest) -> Submission {
        match self.try_submit(request) {
            Ok(background) => Submission {
                response: Response::ok(),
                background,
            },
            Err(e) => {
                log_error(
                    "push_service",
                    "submit",
                    &e.to_string(),
                    Some(self.service_name.as_str()),
                );
                Submission {
                    response: Response::from_error(&e),
                    background: None,
                }
            }
        }
    }

    fn try_submit(&self, request: ServiceRequest) -> Result<Option<JoinHandle<BatchOutcome>>> {
        self.check_service_name(&request)?;

        let messages = self.builder.build(&request.commands)?;
        debug!(messages = messages.len(), "Push request accepted");

        Ok(self.coordinator.dispatch(messages))
    }

    fn check_service_name(&self, request: &ServiceRequest) -> Result<()> {
        if request.service_name.as_deref() == Some(self.service_name.as_str()) {
            return Ok(());
        }
        Err(PushError::ServiceNameMismatch {
            expected: self.service_name.clone(),
            actual: request.service_name.clone(),
        })
    }
}

#[async_trait]
impl ServiceHandler for PushService {
    async fn handle(&self, request: ServiceRequest) -> Response {
        self.submit(request).response
    }

    fn service_name(&self) -> &str {
        &self.service_name
    }
}
