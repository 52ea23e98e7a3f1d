#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use smartsafety_server::app_state::{AppState, Notifier, VoiceAssistant};
use smartsafety_server::config::ServerConfig;
use smartsafety_server::infra::gemini::GeminiAssistant;
use smartsafety_server::infra::rate_limit::FixedWindowLimiter;
use smartsafety_server::infra::retry::RetryPolicy;
use smartsafety_server::infra::sqlite_repo::SqliteRepo;
use smartsafety_server::ports::integration::{
    Assistant, CheckoutRequest, Directions, IntegrationError, Mailer, OutgoingEmail, Payments,
    PushMessage, PushSender,
};
use smartsafety_server::ports::repo::Repo;
use smartsafety_server::router;

pub const DEVICE_KEY: &str = "change-me-device-key";
pub const ASSISTANT_KEY: &str = "assistant-secret-key";
pub const CHECKOUT_URL: &str = "https://checkout.example/session/cs_test_1";

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), IntegrationError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPush {
    pub sent: Mutex<Vec<PushMessage>>,
}

#[async_trait::async_trait]
impl PushSender for RecordingPush {
    async fn send(&self, message: &PushMessage) -> Result<(), IntegrationError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Upstream {
    #[default]
    Working,
    Failing,
    Throttled,
    Unconfigured,
    /// Assistant only: the real HTTP client pointed at a closed port.
    Unreachable,
}

impl Upstream {
    fn error(self) -> IntegrationError {
        match self {
            Upstream::Throttled => IntegrationError::Status {
                status: 429,
                body: "Resource has been exhausted (e.g. check quota).".into(),
            },
            Upstream::Unconfigured => IntegrationError::Unconfigured,
            _ => IntegrationError::Status {
                status: 500,
                body: "backend exploded".into(),
            },
        }
    }
}

pub struct StubAssistant(pub Upstream);

#[async_trait::async_trait]
impl Assistant for StubAssistant {
    async fn generate(&self, prompt: &str) -> Result<String, IntegrationError> {
        match self.0 {
            Upstream::Working => Ok(format!("echo: {}", prompt.lines().last().unwrap_or(""))),
            other => Err(other.error()),
        }
    }
}

pub struct StubDirections(pub Upstream);

#[async_trait::async_trait]
impl Directions for StubDirections {
    async fn route(&self, origin: &str, destination: &str) -> Result<Value, IntegrationError> {
        match self.0 {
            Upstream::Working => Ok(json!({
                "status": "OK",
                "routes": [{"summary": format!("{origin} to {destination}")}]
            })),
            other => Err(other.error()),
        }
    }
}

pub struct StubPayments {
    pub mode: Upstream,
    pub requests: Mutex<Vec<CheckoutRequest>>,
}

#[async_trait::async_trait]
impl Payments for StubPayments {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<String, IntegrationError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.mode {
            Upstream::Working => Ok(CHECKOUT_URL.to_string()),
            other => Err(other.error()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub assistant: Upstream,
    pub directions: Upstream,
    pub payments: Upstream,
    pub voice_limit: u32,
    pub webhook_secret: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            assistant: Upstream::Working,
            directions: Upstream::Working,
            payments: Upstream::Working,
            voice_limit: 10,
            webhook_secret: None,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<dyn Repo>,
    pub mailer: Arc<RecordingMailer>,
    pub push: Arc<RecordingPush>,
    pub payments: Arc<StubPayments>,
}

pub fn test_config() -> ServerConfig {
    toml::from_str(include_str!("../../res/config.toml")).unwrap()
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with(Options::default()).await
    }

    pub async fn with(options: Options) -> Self {
        let config = test_config();
        let sqlite = SqliteRepo::in_memory().await.unwrap();
        sqlite.apply_schema().await.unwrap();
        let repo: Arc<dyn Repo> = Arc::new(sqlite);

        let mut state = AppState::from_config(&config, repo.clone()).unwrap();

        let mailer = Arc::new(RecordingMailer::default());
        let push = Arc::new(RecordingPush::default());
        state.notifier = Notifier {
            mailer: mailer.clone(),
            push: push.clone(),
            fallback_recipient: "admin@example.com".into(),
        };
        let model: Arc<dyn Assistant> = match options.assistant {
            Upstream::Unreachable => Arc::new(GeminiAssistant::new(
                reqwest::Client::new(),
                "http://127.0.0.1:1".into(),
                "gemini-1.5-flash".into(),
                ASSISTANT_KEY.into(),
            )),
            mode => Arc::new(StubAssistant(mode)),
        };
        state.voice = VoiceAssistant {
            model,
            retry: RetryPolicy::new(1, Duration::ZERO),
            limiter: Arc::new(FixedWindowLimiter::new(
                options.voice_limit,
                Duration::from_secs(60),
            )),
        };
        state.directions = Arc::new(StubDirections(options.directions));
        let payments = Arc::new(StubPayments {
            mode: options.payments,
            requests: Mutex::new(Vec::new()),
        });
        state.billing.payments = payments.clone();
        state.billing.frontend_url = "http://app.test".into();
        state.billing.webhook_secret = options.webhook_secret;

        Self {
            router: router(state),
            repo,
            mailer,
            push,
            payments,
        }
    }

    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// POST carrying the device pre-shared key instead of a user token.
    pub async fn post_as_device(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-device-key", DEVICE_KEY)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.call(request).await
    }

    /// Registers and logs in `email`; returns the new user id and a bearer token.
    pub async fn sign_up(&self, email: &str) -> (i64, String) {
        let credentials = json!({"email": email, "password": "secret123"});
        let (status, body) = self
            .send(Method::POST, "/api/auth/register", None, Some(credentials.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["id"].as_i64().unwrap();

        let (status, body) = self
            .send(Method::POST, "/api/auth/login", None, Some(credentials))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (id, body["token"].as_str().unwrap().to_string())
    }

    pub async fn register_device(&self, mac: &str, user_id: i64) -> i64 {
        let (status, body) = self
            .post_as_device("/api/devices", json!({"mac": mac, "name": "wristband", "user_id": user_id}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}
