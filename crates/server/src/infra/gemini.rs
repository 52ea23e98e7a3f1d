//! Generative Language `generateContent` client.
use serde_json::{Value, json};
use tracing::debug;

use super::http::{ensure_success, trim_base};
use crate::ports::integration::{Assistant, IntegrationError};

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiAssistant {
    client: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiAssistant {
    pub fn new(client: reqwest::Client, api_base: String, model: String, api_key: String) -> Self {
        Self {
            client,
            api_base,
            model,
            api_key,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            trim_base(&self.api_base),
            self.model
        )
    }
}

#[async_trait::async_trait]
impl Assistant for GeminiAssistant {
    async fn generate(&self, prompt: &str) -> Result<String, IntegrationError> {
        if self.api_key.trim().is_empty() {
            return Err(IntegrationError::Unconfigured);
        }
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        debug!(model = %self.model, "generateContent start");
        let resp = self
            .client
            .post(self.url())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&body)
            .send()
            .await?;
        let payload: Value = ensure_success(resp).await?.json().await?;
        extract_text(&payload)
            .ok_or_else(|| IntegrationError::Malformed("response carried no text part".into()))
    }
}

/// First text part of the first candidate.
pub fn extract_text(response: &Value) -> Option<String> {
    response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .and_then(|parts| {
            parts
                .iter()
                .find_map(|part| part.get("text").and_then(|t| t.as_str()))
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_comes_from_first_candidate() {
        let payload = json!({
            "candidates": [
                { "content": { "parts": [{ "inlineData": {} }, { "text": "Stay calm." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });
        assert_eq!(extract_text(&payload).as_deref(), Some("Stay calm."));
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
    }

    #[tokio::test]
    async fn posts_prompt_with_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_header("x-goog-api-key", "k-123")
            .match_body(mockito::Matcher::PartialJson(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"hi there"}]}}]}"#)
            .create_async()
            .await;

        let assistant = GeminiAssistant::new(
            reqwest::Client::new(),
            format!("{}/", server.url()),
            "gemini-1.5-flash".into(),
            "k-123".into(),
        );
        assert_eq!(assistant.generate("hello").await.unwrap(), "hi there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn quota_errors_are_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", mockito::Matcher::Any)
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_body(r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let assistant = GeminiAssistant::new(
            reqwest::Client::new(),
            server.url(),
            "gemini-1.5-flash".into(),
            "k".into(),
        );
        let err = assistant.generate("hello").await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn transport_errors_do_not_echo_the_key() {
        let assistant = GeminiAssistant::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".into(),
            "gemini-1.5-flash".into(),
            "very-secret-key".into(),
        );
        let err = assistant.generate("hello").await.unwrap_err();
        assert!(matches!(err, IntegrationError::Transport(_)));
        let text = err.to_string();
        assert!(!text.contains("very-secret-key"));
        assert!(!text.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn missing_key_is_unconfigured() {
        let assistant = GeminiAssistant::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9".into(),
            "m".into(),
            " ".into(),
        );
        let err = assistant.generate("x").await.unwrap_err();
        assert!(matches!(err, IntegrationError::Unconfigured));
    }
}
