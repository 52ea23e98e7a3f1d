//! Checkout sessions against the payment processor's form-encoded REST API.
use serde::Deserialize;
use tracing::info;

use super::http::{ensure_success, trim_base};
use crate::ports::integration::{CheckoutRequest, IntegrationError, Payments};

pub struct StripeCheckout {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    url: Option<String>,
}

impl StripeCheckout {
    pub fn new(client: reqwest::Client, api_base: String, secret_key: String) -> Self {
        Self {
            client,
            api_base,
            secret_key,
        }
    }
}

fn session_form(request: &CheckoutRequest) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "subscription".to_string()),
        ("payment_method_types[0]", "card".to_string()),
        ("line_items[0][price]", request.price_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("customer_email", request.customer_email.clone()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("metadata[user_id]", request.user_id.to_string()),
        ("metadata[plan]", request.plan.clone()),
    ]
}

#[async_trait::async_trait]
impl Payments for StripeCheckout {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<String, IntegrationError> {
        if self.secret_key.trim().is_empty() {
            return Err(IntegrationError::Unconfigured);
        }
        let url = format!("{}/v1/checkout/sessions", trim_base(&self.api_base));
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.secret_key)
            .form(&session_form(request))
            .send()
            .await?;
        let session: SessionResponse = ensure_success(resp).await?.json().await?;
        let url = session
            .url
            .ok_or_else(|| IntegrationError::Malformed("checkout session without url".into()))?;
        info!(user_id = request.user_id, plan = %request.plan, "checkout session created");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            price_id: "price_abc".into(),
            customer_email: "pat@example.com".into(),
            success_url: "http://app/subscription-success".into(),
            cancel_url: "http://app/subscription-cancelled".into(),
            user_id: 7,
            plan: "premium_3m".into(),
        }
    }

    #[tokio::test]
    async fn creates_session_and_returns_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/checkout/sessions")
            .match_header("authorization", "Bearer sk_test")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("mode".into(), "subscription".into()),
                Matcher::UrlEncoded("line_items[0][price]".into(), "price_abc".into()),
                Matcher::UrlEncoded("metadata[user_id]".into(), "7".into()),
                Matcher::UrlEncoded("metadata[plan]".into(), "premium_3m".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id":"cs_1","url":"https://pay.example/cs_1"}"#)
            .create_async()
            .await;

        let payments = StripeCheckout::new(reqwest::Client::new(), server.url(), "sk_test".into());
        let url = payments.create_checkout_session(&request()).await.unwrap();
        assert_eq!(url, "https://pay.example/cs_1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_secret_is_unconfigured() {
        let payments = StripeCheckout::new(reqwest::Client::new(), "http://unused".into(), "".into());
        let err = payments.create_checkout_session(&request()).await.unwrap_err();
        assert!(matches!(err, IntegrationError::Unconfigured));
    }
}
