//! Shared reqwest plumbing for the outbound integrations.
use std::time::Duration;

use reqwest::Response;

use crate::ports::integration::IntegrationError;

const USER_AGENT: &str = concat!("smartsafety-server/", env!("CARGO_PKG_VERSION"));

pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .pool_idle_timeout(Duration::from_secs(120))
        .timeout(Duration::from_secs(30))
        .build()
}

/// Turns a non-2xx response into `IntegrationError::Status`, keeping the body for diagnostics.
pub async fn ensure_success(resp: Response) -> Result<Response, IntegrationError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(IntegrationError::Status {
        status: status.as_u16(),
        body,
    })
}

pub fn trim_base(base: &str) -> &str {
    base.trim_end_matches('/')
}
