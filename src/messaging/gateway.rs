//! # Push Gateway
//!
//! The transport that delivers a batch of [`PushMessage`]s. Gateway clients
//! live outside this crate and plug in through [`PushGateway`].
//!
//! A process normally owns one gateway client. [`GatewaySlot`] holds it and
//! guarantees the factory runs at most once, even under concurrent first use.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info};

use super::batch::BatchResult;
use super::message::PushMessage;

/// Call-level gateway failures; per-message failures live in [`BatchResult`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Gateway transport failure: {0}")]
    Transport(String),
    #[error("Gateway rejected credentials: {0}")]
    Authentication(String),
    #[error("Gateway initialization failed: {0}")]
    Initialization(String),
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Send every message in one call, returning one outcome per message in
    /// submission order
    async fn send_all(&self, messages: &[PushMessage]) -> Result<BatchResult, GatewayError>;

    /// Name used in logs
    fn gateway_name(&self) -> &str;
}

/// Write-once holder for a process-wide gateway client
pub struct GatewaySlot {
    gateway: OnceLock<Arc<dyn PushGateway>>,
    init_lock: Mutex<()>,
}

impl GatewaySlot {
    pub const fn new() -> Self {
        Self {
            gateway: OnceLock::new(),
            init_lock: parking_lot::const_mutex(()),
        }
    }

    /// Initialized gateway, if any
    pub fn get(&self) -> Option<Arc<dyn PushGateway>> {
        self.gateway.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.gateway.get().is_some()
    }

    /// Return the stored gateway, running `init` first if the slot is empty
    ///
    /// A failed `init` leaves the slot empty so a later call may retry.
    pub fn get_or_try_init<F, E>(&self, init: F) -> Result<Arc<dyn PushGateway>, E>
    where
        F: FnOnce() -> Result<Arc<dyn PushGateway>, E>,
    {
        if let Some(gateway) = self.gateway.get() {
            return Ok(gateway.clone());
        }

        let _guard = self.init_lock.lock();
        if let Some(gateway) = self.gateway.get() {
            debug!("Gateway initialized by a concurrent caller");
            return Ok(gateway.clone());
        }

        let gateway = init()?;
        info!(gateway = gateway.gateway_name(), "Push gateway initialized");
        Ok(self.gateway.get_or_init(|| gateway).clone())
    }
}

impl Default for GatewaySlot {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_GATEWAY: GatewaySlot = GatewaySlot::new();

/// The process-wide gateway slot
pub fn default_gateway() -> &'static GatewaySlot {
    &DEFAULT_GATEWAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::batch::SendResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoGateway;

    #[async_trait]
    impl PushGateway for EchoGateway {
        async fn send_all(&self, messages: &[PushMessage]) -> Result<BatchResult, GatewayError> {
            Ok(BatchResult::new(
                messages
                    .iter()
                    .enumerate()
                    .map(|(i, _)| SendResponse::success(format!("m-{i}")))
                    .collect(),
            ))
        }

        fn gateway_name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_factory_runs_once() {
        let slot = GatewaySlot::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let gateway = slot
                .get_or_try_init(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, GatewayError>(Arc::new(EchoGateway) as Arc<dyn PushGateway>)
                })
                .unwrap();
            assert_eq!(gateway.gateway_name(), "echo");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(slot.is_initialized());
    }

    #[test]
    fn test_failed_init_leaves_slot_empty() {
        let slot = GatewaySlot::new();
        let result = slot.get_or_try_init(|| {
            Err::<Arc<dyn PushGateway>, _>(GatewayError::Initialization("no creds".to_string()))
        });
        assert!(result.is_err());
        assert!(slot.get().is_none());

        let gateway = slot
            .get_or_try_init(|| Ok::<_, GatewayError>(Arc::new(EchoGateway) as Arc<dyn PushGateway>))
            .unwrap();
        assert_eq!(gateway.gateway_name(), "echo");
    }

    #[test]
    fn test_concurrent_first_use_initializes_once() {
        let slot = Arc::new(GatewaySlot::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slot = slot.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    slot.get_or_try_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, GatewayError>(Arc::new(EchoGateway) as Arc<dyn PushGateway>)
                    })
                    .map(|_| ())
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
