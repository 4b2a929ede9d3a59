use async_trait::async_trait;
use log::warn;

use crate::dispatch::WebhookDispatcher;
use crate::error::RelayError;
use crate::models::chat::Message;
use crate::reply::{ PatternReplyGenerator, ReplyGenerator };

/// Relays the message to the external automation webhook.
///
/// When the dispatcher exhausts its retries, or the upstream answer has no
/// recognizable shape, the reply degrades to the local pattern generator —
/// the caller never sees a raw transport error.
pub struct WebhookReplyGenerator {
    dispatcher: WebhookDispatcher,
    fallback: PatternReplyGenerator,
}

impl WebhookReplyGenerator {
    pub fn new(dispatcher: WebhookDispatcher) -> Self {
        Self {
            dispatcher,
            fallback: PatternReplyGenerator::new(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for WebhookReplyGenerator {
    async fn generate(
        &self,
        conversation_id: &str,
        message: &str,
        history: &[Message]
    ) -> Result<String, RelayError> {
        match self.dispatcher.dispatch(message, conversation_id).await {
            Ok(reply) if reply.success => Ok(reply.text),
            Ok(_) => {
                warn!(
                    "Webhook response format not recognized for {}, falling back to local replies",
                    conversation_id
                );
                self.fallback.generate(conversation_id, message, history).await
            }
            Err(e) => {
                warn!(
                    "Webhook dispatch failed for {} ({}), falling back to local replies",
                    conversation_id,
                    e
                );
                self.fallback.generate(conversation_id, message, history).await
            }
        }
    }
}
