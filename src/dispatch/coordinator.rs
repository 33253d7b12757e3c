//! # Dispatch Coordinator
//!
//! Sends a built batch through the push gateway on a detached task. The
//! caller gets control back as soon as the task is spawned; gateway latency,
//! per-message failures and reconciliation all stay on the background path.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::reconciler::{ReconcileOutcome, TokenReconciler};
use crate::logging::{log_error, log_push_operation};
use crate::messaging::{PushGateway, PushMessage};

/// How a background batch finished
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// The gateway call itself failed; the batch was discarded
    GatewayFailed { error: String },
    /// The gateway returned a result that does not line up with the batch
    Misaligned { expected: usize, actual: usize },
    /// Every message was accepted
    Delivered { sent: usize },
    /// Some messages failed and reconciliation ran
    Reconciled {
        failures: usize,
        outcome: ReconcileOutcome,
    },
}

pub struct DispatchCoordinator {
    gateway: Arc<dyn PushGateway>,
    reconciler: Arc<TokenReconciler>,
}

impl DispatchCoordinator {
    pub fn new(gateway: Arc<dyn PushGateway>, reconciler: Arc<TokenReconciler>) -> Self {
        Self {
            gateway,
            reconciler,
        }
    }

    /// Send `messages` as one batch in the background
    ///
    /// Returns `None` without touching the gateway when there is nothing to
    /// send. Must be called from within a tokio runtime.
    pub fn dispatch(&self, messages: Vec<PushMessage>) -> Option<JoinHandle<BatchOutcome>> {
        if messages.is_empty() {
            debug!("Empty batch, skipping gateway call");
            return None;
        }

        let batch_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "push_batch",
            batch_id = %batch_id,
            message_count = messages.len(),
            gateway = self.gateway.gateway_name()
        );

        let gateway = self.gateway.clone();
        let reconciler = self.reconciler.clone();
        log_push_operation("send_all", Some(&batch_id), messages.len(), "accepted", None);

        Some(tokio::spawn(
            async move { run_batch(gateway, reconciler, messages).await }.instrument(span),
        ))
    }
}

async fn run_batch(
    gateway: Arc<dyn PushGateway>,
    reconciler: Arc<TokenReconciler>,
    messages: Vec<PushMessage>,
) -> BatchOutcome {
    let result = match gateway.send_all(&messages).await {
        Ok(result) => result,
        Err(e) => {
            log_error("dispatch", "send_all", &e.to_string(), Some("batch discarded"));
            return BatchOutcome::GatewayFailed {
                error: e.to_string(),
            };
        }
    };

    if result.len() != messages.len() {
        warn!(
            expected = messages.len(),
            actual = result.len(),
            "Batch result is not aligned with submitted messages, skipping reconciliation"
        );
        return BatchOutcome::Misaligned {
            expected: messages.len(),
            actual: result.len(),
        };
    }

    let failures = result.failure_count();
    if failures == 0 {
        info!(sent = result.success_count(), "Batch delivered");
        return BatchOutcome::Delivered {
            sent: result.success_count(),
        };
    }

    warn!(
        sent = result.success_count(),
        failures, "Batch completed with failed sends"
    );
    let outcome = reconciler.reconcile(&messages, &result).await;
    BatchOutcome::Reconciled { failures, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AttributeResolver, ConfigAttributeResolver};
    use crate::dispatch::ReconciliationPolicy;
    use crate::logging::capture::ErrorEvents;
    use crate::messaging::{
        AndroidConfig, BatchResult, GatewayError, MessagingErrorCode, SendResponse,
    };
    use crate::records::{Response, ServiceRequest};
    use crate::registry::{DispatchError, ServiceDispatcher};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Fails every index listed in `fail`, or the whole call when `down`
    #[derive(Default)]
    struct ScriptedGateway {
        fail: Vec<usize>,
        down: bool,
        short: bool,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl PushGateway for ScriptedGateway {
        async fn send_all(&self, messages: &[PushMessage]) -> Result<BatchResult, GatewayError> {
            *self.calls.lock() += 1;
            if self.down {
                return Err(GatewayError::Transport("connection reset".to_string()));
            }
            let mut responses: Vec<_> = (0..messages.len())
                .map(|i| {
                    if self.fail.contains(&i) {
                        SendResponse::failure(MessagingErrorCode::Unregistered, None)
                    } else {
                        SendResponse::success(format!("m{i}"))
                    }
                })
                .collect();
            if self.short {
                responses.pop();
            }
            Ok(BatchResult::new(responses))
        }

        fn gateway_name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct CountingDispatcher {
        calls: Mutex<Vec<ServiceRequest>>,
    }

    #[async_trait]
    impl ServiceDispatcher for CountingDispatcher {
        async fn execute(
            &self,
            _service_name: &str,
            request: ServiceRequest,
        ) -> Result<Response, DispatchError> {
            self.calls.lock().push(request);
            Ok(Response::ok())
        }
    }

    fn coordinator(
        gateway: Arc<ScriptedGateway>,
        dispatcher: Arc<CountingDispatcher>,
    ) -> DispatchCoordinator {
        let attributes: Arc<dyn AttributeResolver> = Arc::new(
            ConfigAttributeResolver::default().with_attribute("DeleteToken", "Push.Service.TokenStore"),
        );
        let reconciler = TokenReconciler::new(dispatcher, attributes, ReconciliationPolicy::AllFailures);
        DispatchCoordinator::new(gateway, Arc::new(reconciler))
    }

    fn messages(count: usize) -> Vec<PushMessage> {
        let platform = Arc::new(AndroidConfig::default());
        (0..count)
            .map(|i| PushMessage::new(Some(format!("token-{i}")), platform.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_dispatch_skips_gateway() {
        let gateway = Arc::new(ScriptedGateway::default());
        let dispatcher = Arc::new(CountingDispatcher::default());
        let coordinator = coordinator(gateway.clone(), dispatcher.clone());

        assert!(coordinator.dispatch(Vec::new()).is_none());
        assert_eq!(*gateway.calls.lock(), 0);
        assert!(dispatcher.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_all_delivered() {
        let gateway = Arc::new(ScriptedGateway::default());
        let dispatcher = Arc::new(CountingDispatcher::default());
        let coordinator = coordinator(gateway.clone(), dispatcher.clone());

        let outcome = coordinator.dispatch(messages(3)).unwrap().await.unwrap();

        assert_eq!(outcome, BatchOutcome::Delivered { sent: 3 });
        assert_eq!(*gateway.calls.lock(), 1);
        assert!(dispatcher.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_reconciles_failed_tokens() {
        let gateway = Arc::new(ScriptedGateway {
            fail: vec![1],
            ..Default::default()
        });
        let dispatcher = Arc::new(CountingDispatcher::default());
        let coordinator = coordinator(gateway, dispatcher.clone());

        let outcome = coordinator.dispatch(messages(2)).unwrap().await.unwrap();
        assert!(matches!(outcome, BatchOutcome::Reconciled { failures: 1, .. }));

        let calls = dispatcher.calls.lock();
        assert_eq!(calls.len(), 1);
        let command = calls[0].commands.get("1").unwrap();
        assert_eq!(command.row_count(), 1);
        assert_eq!(command.rows[0].text("TOKEN_STR"), Some("token-1"));
    }

    #[tokio::test]
    async fn test_gateway_failure_discards_batch() {
        let gateway = Arc::new(ScriptedGateway {
            down: true,
            ..Default::default()
        });
        let dispatcher = Arc::new(CountingDispatcher::default());
        let coordinator = coordinator(gateway, dispatcher.clone());

        let errors = ErrorEvents::default();
        let _guard = errors.install();

        let outcome = coordinator.dispatch(messages(2)).unwrap().await.unwrap();

        assert!(matches!(outcome, BatchOutcome::GatewayFailed { .. }));
        assert!(dispatcher.calls.lock().is_empty());
        assert_eq!(errors.count(), 1);
    }

    #[tokio::test]
    async fn test_misaligned_result_is_not_reconciled() {
        let gateway = Arc::new(ScriptedGateway {
            fail: vec![0],
            short: true,
            ..Default::default()
        });
        let dispatcher = Arc::new(CountingDispatcher::default());
        let coordinator = coordinator(gateway, dispatcher.clone());

        let outcome = coordinator.dispatch(messages(3)).unwrap().await.unwrap();

        assert_eq!(
            outcome,
            BatchOutcome::Misaligned {
                expected: 3,
                actual: 2
            }
        );
        assert!(dispatcher.calls.lock().is_empty());
    }
}
