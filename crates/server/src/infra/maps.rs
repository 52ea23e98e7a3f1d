use serde_json::Value;

use super::http::{ensure_success, trim_base};
use crate::ports::integration::{Directions, IntegrationError};

/// Directions API proxy; the upstream JSON is returned untouched.
pub struct MapsDirections {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl MapsDirections {
    pub fn new(client: reqwest::Client, api_base: String, api_key: String) -> Self {
        Self {
            client,
            api_base,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl Directions for MapsDirections {
    async fn route(&self, origin: &str, destination: &str) -> Result<Value, IntegrationError> {
        if self.api_key.trim().is_empty() {
            return Err(IntegrationError::Unconfigured);
        }
        let url = format!("{}/maps/api/directions/json", trim_base(&self.api_base));
        let resp = self
            .client
            .get(url)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }
}
