//! Mail and push senders. HTTP variants talk to a relay; log variants only trace.
use serde_json::json;
use tracing::{debug, info};

use super::http::ensure_success;
use crate::ports::integration::{IntegrationError, Mailer, OutgoingEmail, PushMessage, PushSender};

pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: Option<String>,
        from: String,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            from,
        }
    }
}

#[async_trait::async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), IntegrationError> {
        let mut request = self.client.post(&self.endpoint).json(&json!({
            "from": self.from,
            "to": email.to,
            "subject": email.subject,
            "text": email.text,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        debug!(to = %email.to, "mail send start");
        ensure_success(request.send().await?).await?;
        Ok(())
    }
}

pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), IntegrationError> {
        info!(to = %email.to, subject = %email.subject, "mail relay not configured; logging message");
        Ok(())
    }
}

/// Legacy FCM HTTP API: `Authorization: key=<server key>`.
pub struct FcmPush {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

impl FcmPush {
    pub fn new(client: reqwest::Client, endpoint: String, server_key: String) -> Self {
        Self {
            client,
            endpoint,
            server_key,
        }
    }
}

#[async_trait::async_trait]
impl PushSender for FcmPush {
    async fn send(&self, message: &PushMessage) -> Result<(), IntegrationError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("key={}", self.server_key))
            .json(&json!({
                "to": message.token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
            }))
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }
}

pub struct LogPush;

#[async_trait::async_trait]
impl PushSender for LogPush {
    async fn send(&self, message: &PushMessage) -> Result<(), IntegrationError> {
        info!(title = %message.title, "push provider not configured; logging notification");
        Ok(())
    }
}
