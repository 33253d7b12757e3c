//! Per-message outcomes of one batch send.
//!
//! `BatchResult.responses[i]` always describes `messages[i]` of the submitted
//! batch; token reconciliation relies on that alignment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes reported by the gateway for individual messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagingErrorCode {
    Unregistered,
    InvalidArgument,
    SenderIdMismatch,
    QuotaExceeded,
    Unavailable,
    Internal,
    ThirdPartyAuthError,
    Unknown,
}

impl MessagingErrorCode {
    /// Whether the failure says the token itself will never succeed
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            MessagingErrorCode::Unregistered
                | MessagingErrorCode::InvalidArgument
                | MessagingErrorCode::SenderIdMismatch
        )
    }
}

impl fmt::Display for MessagingErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            MessagingErrorCode::Unregistered => "UNREGISTERED",
            MessagingErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            MessagingErrorCode::SenderIdMismatch => "SENDER_ID_MISMATCH",
            MessagingErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            MessagingErrorCode::Unavailable => "UNAVAILABLE",
            MessagingErrorCode::Internal => "INTERNAL",
            MessagingErrorCode::ThirdPartyAuthError => "THIRD_PARTY_AUTH_ERROR",
            MessagingErrorCode::Unknown => "UNKNOWN",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendFailure {
    pub code: MessagingErrorCode,
    pub message: Option<String>,
}

impl fmt::Display for SendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Outcome of one message within a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    pub message_id: Option<String>,
    pub error: Option<SendFailure>,
}

impl SendResponse {
    pub fn success(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failure(code: MessagingErrorCode, message: Option<String>) -> Self {
        Self {
            message_id: None,
            error: Some(SendFailure { code, message }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Human-readable failure detail, if the send failed
    pub fn error_detail(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Index-aligned outcomes of one batch send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub responses: Vec<SendResponse>,
}

impl BatchResult {
    pub fn new(responses: Vec<SendResponse>) -> Self {
        Self { responses }
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.responses.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.responses.len() - self.success_count()
    }

    /// Indices of failed messages, in submission order
    pub fn failed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.responses
            .iter()
            .enumerate()
            .filter(|(_, response)| !response.is_success())
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_failed_indices() {
        let result = BatchResult::new(vec![
            SendResponse::success("m-0"),
            SendResponse::failure(MessagingErrorCode::Unregistered, None),
            SendResponse::success("m-2"),
            SendResponse::failure(
                MessagingErrorCode::Unavailable,
                Some("try later".to_string()),
            ),
        ]);

        assert_eq!(result.len(), 4);
        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 2);
        assert_eq!(result.failed_indices().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(
            result.responses[3].error_detail().as_deref(),
            Some("UNAVAILABLE: try later")
        );
        assert!(result.responses[0].error_detail().is_none());
    }

    #[test]
    fn test_permanent_codes() {
        assert!(MessagingErrorCode::Unregistered.is_permanent());
        assert!(MessagingErrorCode::InvalidArgument.is_permanent());
        assert!(!MessagingErrorCode::Unavailable.is_permanent());
        assert!(!MessagingErrorCode::QuotaExceeded.is_permanent());
    }
}
