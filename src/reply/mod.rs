mod pattern;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::info;

use crate::cli::Args;
use crate::dispatch::{ DispatchConfig, WebhookDispatcher };
use crate::error::RelayError;
use crate::models::chat::Message;

pub use pattern::PatternReplyGenerator;
pub use webhook::WebhookReplyGenerator;

/// Source of assistant replies.
///
/// Implementations receive the inbound message plus the conversation's
/// history (user message already appended) and return plain reply text.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(
        &self,
        conversation_id: &str,
        message: &str,
        history: &[Message]
    ) -> Result<String, RelayError>;
}

pub fn create_reply_generator(args: &Args) -> Result<Arc<dyn ReplyGenerator>, RelayError> {
    match args.reply_backend.to_lowercase().as_str() {
        "pattern" => {
            info!("Replies will be generated locally (pattern backend)");
            Ok(Arc::new(PatternReplyGenerator::new()))
        }
        "webhook" => {
            let url = args.webhook_url
                .clone()
                .ok_or_else(|| {
                    RelayError::Config(
                        "WEBHOOK_URL is required when the reply backend is 'webhook'".to_string()
                    )
                })?;

            let mut config = DispatchConfig::new(url);
            config.timeout = Duration::from_secs(args.webhook_timeout_secs);
            config.max_attempts = args.webhook_retry_attempts;
            config.backoff_base = Duration::from_millis(args.webhook_backoff_base_ms);

            info!("Replies will be relayed to webhook at {}", config.url);
            let dispatcher = WebhookDispatcher::new(config)?;
            Ok(Arc::new(WebhookReplyGenerator::new(dispatcher)))
        }
        other => {
            Err(RelayError::Config(format!("Unsupported reply backend: {}", other)))
        }
    }
}
