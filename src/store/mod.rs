mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::error::RelayError;
use crate::models::chat::{ Conversation, ConversationSummary, Message };

pub use memory::MemoryConversationStore;

/// Keyed collection of conversations and their append-only message logs.
///
/// Constructed once at process start and shared across request handlers;
/// swapping in a persistent backend only requires another implementation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Resolves a conversation, creating it when absent.
    ///
    /// A missing id generates a fresh identifier; a supplied but unknown id
    /// creates the conversation under that identifier.
    async fn get_or_create(&self, id: Option<&str>) -> Conversation;

    /// Appends to an existing conversation and bumps `updated_at`.
    ///
    /// Returns the stored message, or `NotFound` for an unknown id.
    async fn append(&self, conversation_id: &str, message: Message) -> Result<Message, RelayError>;

    async fn get(&self, conversation_id: &str) -> Option<Conversation>;

    /// Summaries of all conversations, oldest first.
    async fn list(&self) -> Vec<ConversationSummary>;

    /// Removes a whole conversation; returns whether one existed.
    async fn delete(&self, conversation_id: &str) -> bool;

    async fn len(&self) -> usize;
}

pub fn initialize_store() -> Arc<dyn ConversationStore> {
    info!("Conversation history will be held in process memory");
    Arc::new(MemoryConversationStore::new())
}
