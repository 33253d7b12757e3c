//! Mock Framework Implementation for Testing
//!
//! Stand-ins for the collaborators the push service talks to: a push gateway
//! that records every batch and fails chosen tokens, and a token store
//! service that records the deletion requests it receives.

use async_trait::async_trait;
use fcm_dispatch::config::ConfigAttributeResolver;
use fcm_dispatch::messaging::{
    BatchResult, GatewayError, MessagingErrorCode, PushGateway, PushMessage, SendResponse,
};
use fcm_dispatch::records::{Command, Response, Row, ServiceRequest};
use fcm_dispatch::registry::ServiceHandler;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PUSH_SERVICE: &str = "Push.Service.FcmPushService";
pub const TOKEN_STORE: &str = "Push.Service.TokenStore";
pub const DEFAULT_IMAGE: &str = "https://cdn.example.com/push/default.png";

/// Recorded gateway traffic
#[derive(Debug, Default, Clone)]
pub struct MockGatewayState {
    /// Every batch passed to `send_all`, in call order
    pub batches: Vec<Vec<PushMessage>>,
}

/// Gateway double that fails configured tokens
pub struct MockGateway {
    state: Arc<Mutex<MockGatewayState>>,
    failing_tokens: HashMap<String, MessagingErrorCode>,
    unavailable: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockGatewayState::default())),
            failing_tokens: HashMap::new(),
            unavailable: false,
        }
    }

    /// Report `token` as undeliverable with `code`
    pub fn failing(mut self, token: impl Into<String>, code: MessagingErrorCode) -> Self {
        self.failing_tokens.insert(token.into(), code);
        self
    }

    /// Fail every call at the transport level
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn state(&self) -> MockGatewayState {
        self.state.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().batches.len()
    }
}

#[async_trait]
impl PushGateway for MockGateway {
    async fn send_all(&self, messages: &[PushMessage]) -> Result<BatchResult, GatewayError> {
        self.state.lock().unwrap().batches.push(messages.to_vec());

        if self.unavailable {
            return Err(GatewayError::Transport("gateway unavailable".to_string()));
        }

        let responses = messages
            .iter()
            .enumerate()
            .map(|(index, message)| {
                match message.token().and_then(|t| self.failing_tokens.get(t)) {
                    Some(code) => SendResponse::failure(*code, Some("rejected by mock".to_string())),
                    None => SendResponse::success(format!("projects/mock/messages/{index}")),
                }
            })
            .collect();

        Ok(BatchResult::new(responses))
    }

    fn gateway_name(&self) -> &str {
        "mock-gateway"
    }
}

/// Token store double registered under [`TOKEN_STORE`]
pub struct MockTokenStore {
    requests: Arc<Mutex<Vec<ServiceRequest>>>,
    reply: Response,
}

impl MockTokenStore {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            reply: Response::ok(),
        }
    }

    pub fn replying(mut self, reply: Response) -> Self {
        self.reply = reply;
        self
    }

    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Tokens named by every deletion row received so far
    pub fn deleted_tokens(&self) -> Vec<String> {
        self.requests()
            .iter()
            .flat_map(|request| {
                request
                    .commands
                    .iter()
                    .flat_map(|(_, command)| command.rows.clone())
                    .collect::<Vec<_>>()
            })
            .filter_map(|row| row.text("TOKEN_STR").map(str::to_string))
            .collect()
    }

    /// Poll until at least `count` deletion requests arrived
    pub async fn wait_for_requests(&self, count: usize) -> bool {
        for _ in 0..100 {
            if self.requests.lock().unwrap().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl ServiceHandler for MockTokenStore {
    async fn handle(&self, request: ServiceRequest) -> Response {
        self.requests.lock().unwrap().push(request);
        self.reply.clone()
    }

    fn service_name(&self) -> &str {
        TOKEN_STORE
    }
}

/// Attributes a configured push service would see
pub fn test_attributes() -> ConfigAttributeResolver {
    ConfigAttributeResolver::default()
        .with_attribute("OK", DEFAULT_IMAGE)
        .with_attribute("Promo", "https://cdn.example.com/push/promo.png")
        .with_attribute("DeleteToken", TOKEN_STORE)
        .with_attribute("AndroidConfig.Priority", "High")
        .with_attribute("AndroidConfig.TimeToLive", "1 12:00:00")
}

/// A push row with the usual fields
pub fn push_row(token: &str, image_url: &str, data: &str) -> Row {
    Row::new()
        .with("Token", token)
        .with("Title", "T")
        .with("Body", "B")
        .with("ImageUrl", image_url)
        .with("Data", data)
}

/// A request addressed to `service_name` carrying one command per entry
pub fn push_request(service_name: &str, commands: Vec<(&str, Vec<Row>)>) -> ServiceRequest {
    let mut request = ServiceRequest::new(service_name);
    for (key, rows) in commands {
        let mut command = Command::new("push");
        for row in rows {
            command.push_row(row);
        }
        request.commands.insert(key, command);
    }
    request
}

/// Tokens of every message in a batch, in order
pub fn tokens_of(batch: &[PushMessage]) -> Vec<String> {
    batch
        .iter()
        .map(|m| m.token().unwrap_or_default().to_string())
        .collect()
}

/// Distinct tokens, for assertions that ignore order
pub fn token_set(tokens: &[String]) -> HashSet<String> {
    tokens.iter().cloned().collect()
}
