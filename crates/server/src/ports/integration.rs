//! Outbound integrations: mail, push, the assistant model, directions and checkout.
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("integration not configured")]
    Unconfigured,
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected upstream response: {0}")]
    Malformed(String),
}

/// Request URLs may carry API keys, so they are dropped before the error travels further.
impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        IntegrationError::Transport(err.without_url())
    }
}

impl IntegrationError {
    /// Upstream throttling: HTTP 429, or a body that talks about rate limits or quota.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            IntegrationError::Status { status: 429, .. } => true,
            IntegrationError::Status { body, .. } => {
                let body = body.to_lowercase();
                body.contains("rate limit") || body.contains("quota")
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub price_id: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub user_id: i64,
    pub plan: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), IntegrationError>;
}

#[async_trait::async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), IntegrationError>;
}

#[async_trait::async_trait]
pub trait Assistant: Send + Sync {
    /// Returns the model's text reply to a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String, IntegrationError>;
}

#[async_trait::async_trait]
pub trait Directions: Send + Sync {
    async fn route(&self, origin: &str, destination: &str) -> Result<Value, IntegrationError>;
}

#[async_trait::async_trait]
pub trait Payments: Send + Sync {
    /// Returns the hosted checkout URL.
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<String, IntegrationError>;
}
