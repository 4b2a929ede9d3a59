pub mod normalize;

use std::time::Duration;

use chrono::Utc;
use log::{ info, warn };
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::RelayError;

pub use normalize::{ normalize_webhook_response, NormalizedReply, UNRECOGNIZED_REPLY };

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub url: String,
    pub timeout: Duration,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before retry k (0-indexed) is `backoff_base * 2^k`.
    pub backoff_base: Duration,
}

impl DispatchConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Body sent to the automation endpoint. The message rides in both `text`
/// and `message` because deployed workflows read either field.
#[derive(Serialize)]
struct OutboundPayload<'a> {
    text: &'a str,
    message: &'a str,
    conversation_id: &'a str,
    timestamp: String,
}

/// Issues one logical webhook call with bounded retries.
///
/// Only transport-level failures (timeout, connect, DNS) are retried;
/// an HTTP error status or an undecodable body propagates immediately.
pub struct WebhookDispatcher {
    http: reqwest::Client,
    config: DispatchConfig,
}

impl WebhookDispatcher {
    pub fn new(config: DispatchConfig) -> Result<Self, RelayError> {
        Url::parse(&config.url)
            .map_err(|e| RelayError::Config(format!("Invalid webhook URL '{}': {}", config.url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// One logical dispatch: succeeds with a normalized reply or fails with
    /// the last attempt's error once retries are exhausted.
    pub async fn dispatch(
        &self,
        message: &str,
        conversation_id: &str
    ) -> Result<NormalizedReply, RelayError> {
        let mut attempt = 0;
        loop {
            info!("Webhook attempt {}/{}", attempt + 1, self.config.max_attempts);

            match self.send_once(message, conversation_id).await {
                Ok(reply) => {
                    return Ok(reply);
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.config.max_attempts => {
                    let delay = backoff_delay(self.config.backoff_base, attempt);
                    warn!(
                        "Webhook attempt {}/{} failed ({}), retrying in {:?}",
                        attempt + 1,
                        self.config.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(
        &self,
        message: &str,
        conversation_id: &str
    ) -> Result<NormalizedReply, RelayError> {
        let payload = OutboundPayload {
            text: message,
            message,
            conversation_id,
            timestamp: Utc::now().to_rfc3339(),
        };

        let response = self.http
            .post(&self.config.url)
            .json(&payload)
            .send().await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamRejected { status: status.as_u16() });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::UpstreamTimeout
            } else {
                RelayError::UpstreamBadPayload(e.to_string())
            }
        })?;

        Ok(normalize_webhook_response(&body, conversation_id))
    }
}

fn classify_transport_error(e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::UpstreamTimeout
    } else {
        RelayError::UpstreamUnreachable(e.to_string())
    }
}

/// Exponential backoff schedule: base, 2*base, 4*base, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}
