use std::sync::Arc;
use std::time::Duration;

use crate::auth::{TokenKeys, hash_token};
use crate::config::{ConfigError, PlanConfig, ServerConfig};
use crate::infra::gemini::GeminiAssistant;
use crate::infra::http::build_client;
use crate::infra::maps::MapsDirections;
use crate::infra::notify::{FcmPush, HttpMailer, LogMailer, LogPush};
use crate::infra::rate_limit::FixedWindowLimiter;
use crate::infra::retry::RetryPolicy;
use crate::infra::stripe::StripeCheckout;
use crate::ports::integration::{Assistant, Directions, Mailer, Payments, PushSender};
use crate::ports::repo::Repo;

#[derive(Clone)]
pub struct Notifier {
    pub mailer: Arc<dyn Mailer>,
    pub push: Arc<dyn PushSender>,
    /// Used when the alerting user has no email on file.
    pub fallback_recipient: String,
}

#[derive(Clone)]
pub struct Billing {
    pub payments: Arc<dyn Payments>,
    pub plans: Vec<PlanConfig>,
    pub frontend_url: String,
    pub webhook_secret: Option<String>,
}

impl Billing {
    pub fn plan(&self, name: &str) -> Option<&PlanConfig> {
        self.plans.iter().find(|p| p.name == name)
    }
}

#[derive(Clone)]
pub struct VoiceAssistant {
    pub model: Arc<dyn Assistant>,
    pub retry: RetryPolicy,
    pub limiter: Arc<FixedWindowLimiter>,
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub tokens: Arc<TokenKeys>,
    /// SHA-256 of the device pre-shared key; `None` disables device access.
    pub device_key_hash: Option<String>,
    pub notifier: Notifier,
    pub voice: VoiceAssistant,
    pub directions: Arc<dyn Directions>,
    pub billing: Billing,
}

impl AppState {
    /// Wires the HTTP-backed integrations described by `config` around `repo`.
    pub fn from_config(config: &ServerConfig, repo: Arc<dyn Repo>) -> Result<Self, ConfigError> {
        let client = build_client()
            .map_err(|e| ConfigError::Invalid(format!("http client build failed: {e}")))?;

        let mailer: Arc<dyn Mailer> = match non_blank(config.mail.endpoint.as_deref()) {
            Some(endpoint) => Arc::new(HttpMailer::new(
                client.clone(),
                endpoint,
                non_blank(config.mail.api_key.as_deref()),
                config.mail.from.clone(),
            )),
            None => Arc::new(LogMailer),
        };

        let push: Arc<dyn PushSender> = match (
            non_blank(config.push.endpoint.as_deref()),
            non_blank(config.push.server_key.as_deref()),
        ) {
            (Some(endpoint), Some(key)) => Arc::new(FcmPush::new(client.clone(), endpoint, key)),
            _ => Arc::new(LogPush),
        };

        let assistant = &config.assistant;
        let voice = VoiceAssistant {
            model: Arc::new(GeminiAssistant::new(
                client.clone(),
                assistant.api_base.clone(),
                assistant.model.clone(),
                assistant.api_key.clone(),
            )),
            retry: RetryPolicy::new(
                assistant.max_retries,
                Duration::from_millis(assistant.base_delay_ms),
            ),
            limiter: Arc::new(FixedWindowLimiter::new(
                assistant.rate_limit_requests,
                Duration::from_secs(assistant.rate_limit_window_seconds),
            )),
        };

        let directions = Arc::new(MapsDirections::new(
            client.clone(),
            config.maps.api_base.clone(),
            config.maps.api_key.clone(),
        ));

        let payments = &config.payments;
        let billing = Billing {
            payments: Arc::new(StripeCheckout::new(
                client,
                payments.api_base.clone(),
                payments.secret_key.clone(),
            )),
            plans: payments.plans.clone(),
            frontend_url: payments.frontend_url.trim_end_matches('/').to_string(),
            webhook_secret: non_blank(Some(&payments.webhook_secret)),
        };

        Ok(Self {
            repo,
            tokens: Arc::new(TokenKeys::new(
                &config.auth.jwt_secret,
                config.auth.token_ttl_seconds,
            )),
            device_key_hash: non_blank(Some(&config.auth.device_api_key)).map(|k| hash_token(&k)),
            notifier: Notifier {
                mailer,
                push,
                fallback_recipient: config.mail.fallback_recipient.clone(),
            },
            voice,
            directions,
            billing,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
