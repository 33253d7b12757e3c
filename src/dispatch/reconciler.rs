//! # Token Reconciler
//!
//! Turns per-message delivery failures into a deletion command and runs it
//! against the service named by the `DeleteToken` attribute. Runs on the
//! background completion path of a batch, so every outcome is logged and
//! returned as a [`ReconcileOutcome`]; nothing is raised.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::AttributeResolver;
use crate::constants::{attributes, reconciliation};
use crate::logging::log_reconciliation;
use crate::messaging::{BatchResult, PushMessage, SendResponse};
use crate::records::{Command, CommandKind, CommandRecordSet, Response, ServiceRequest};
use crate::registry::ServiceDispatcher;

/// Which failed sends lead to token deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconciliationPolicy {
    /// Every failed send deletes its token
    #[default]
    AllFailures,
    /// Only failures whose code marks the token itself as invalid
    PermanentOnly,
}

impl ReconciliationPolicy {
    pub fn from_config(reconcile_transient_failures: bool) -> Self {
        if reconcile_transient_failures {
            Self::AllFailures
        } else {
            Self::PermanentOnly
        }
    }

    fn selects(&self, response: &SendResponse) -> bool {
        match response.error.as_ref() {
            None => false,
            Some(failure) => match self {
                Self::AllFailures => true,
                Self::PermanentOnly => failure.code.is_permanent(),
            },
        }
    }
}

/// What a reconciliation pass did
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// No failed entry was selected; the dispatcher was not called
    NothingToReconcile,
    /// The deletion target could not be determined
    Skipped { reason: String },
    /// The deletion command ran and returned `response`
    Dispatched { rows: usize, response: Response },
    /// The dispatcher itself failed
    Failed { rows: usize, error: String },
}

pub struct TokenReconciler {
    dispatcher: Arc<dyn ServiceDispatcher>,
    attributes: Arc<dyn AttributeResolver>,
    policy: ReconciliationPolicy,
}

impl TokenReconciler {
    pub fn new(
        dispatcher: Arc<dyn ServiceDispatcher>,
        attributes: Arc<dyn AttributeResolver>,
        policy: ReconciliationPolicy,
    ) -> Self {
        Self {
            dispatcher,
            attributes,
            policy,
        }
    }

    pub fn policy(&self) -> ReconciliationPolicy {
        self.policy
    }

    /// Build the deletion command for the failed entries of `result`
    ///
    /// `None` when nothing is selected. `result` must be index-aligned with
    /// `messages`.
    pub fn build_command(
        &self,
        delete_service: &str,
        messages: &[PushMessage],
        result: &BatchResult,
    ) -> Option<Command> {
        let mut command =
            Command::new(delete_service).with_kind(CommandKind::StoredProcedure);

        for (message, response) in messages.iter().zip(result.responses.iter()) {
            if !self.policy.selects(response) {
                continue;
            }
            command.new_row();
            command.set_value(reconciliation::TOKEN_TYPE_PARAM, reconciliation::TOKEN_TYPE_FCM);
            command.set_value(
                reconciliation::TOKEN_STR_PARAM,
                message.token.clone(),
            );
        }

        if command.row_count() == 0 {
            None
        } else {
            Some(command)
        }
    }

    /// Delete the tokens of failed messages through the dispatcher
    pub async fn reconcile(
        &self,
        messages: &[PushMessage],
        result: &BatchResult,
    ) -> ReconcileOutcome {
        if result.failure_count() == 0 {
            debug!("No failed sends, nothing to reconcile");
            return ReconcileOutcome::NothingToReconcile;
        }

        let delete_service = match self.attributes.get_attribute(attributes::DELETE_TOKEN) {
            Ok(name) if !name.trim().is_empty() => name,
            Ok(_) => return self.skip("DeleteToken attribute is empty".to_string()),
            Err(e) => return self.skip(e.to_string()),
        };

        let Some(command) = self.build_command(&delete_service, messages, result) else {
            debug!(
                failures = result.failure_count(),
                policy = ?self.policy,
                "No failed send selected for token deletion"
            );
            return ReconcileOutcome::NothingToReconcile;
        };

        let rows = command.row_count();
        let commands =
            CommandRecordSet::new().with_command(reconciliation::COMMAND_KEY, command);
        let request = ServiceRequest::new(delete_service.clone())
            .with_transaction_scope(false)
            .with_commands(commands);

        match self.dispatcher.execute(&delete_service, request).await {
            Ok(response) if response.is_ok() => {
                log_reconciliation(&delete_service, rows, "deleted", None);
                info!(service_name = %delete_service, rows, "Invalid tokens deleted");
                ReconcileOutcome::Dispatched { rows, response }
            }
            Ok(response) => {
                let message = response
                    .message
                    .clone()
                    .unwrap_or_else(|| "Token deletion returned an error status".to_string());
                log_reconciliation(&delete_service, rows, "error", Some(&message));
                error!(service_name = %delete_service, rows, message = %message, "Token deletion failed");
                ReconcileOutcome::Dispatched { rows, response }
            }
            Err(e) => {
                log_reconciliation(&delete_service, rows, "dispatch_failed", Some(&e.to_string()));
                error!(service_name = %delete_service, rows, error = %e, "Token deletion could not be dispatched");
                ReconcileOutcome::Failed {
                    rows,
                    error: e.to_string(),
                }
            }
        }
    }

    fn skip(&self, reason: String) -> ReconcileOutcome {
        error!(reason = %reason, "Token deletion target unavailable, skipping reconciliation");
        ReconcileOutcome::Skipped { reason }
    }
}
