use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{ Mutex, RwLock };
use uuid::Uuid;

use crate::error::RelayError;
use crate::models::chat::{ Conversation, ConversationSummary, Message };
use crate::store::ConversationStore;

/// In-memory store. Contents live for the process lifetime only.
///
/// The outer map lock is held just long enough to resolve an entry; the
/// per-conversation mutex serializes appends on the same id, so concurrent
/// writes to different conversations never contend on a shared lock.
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<String, Arc<Mutex<Conversation>>>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
        }
    }

    async fn entry(&self, conversation_id: &str) -> Option<Arc<Mutex<Conversation>>> {
        self.conversations.read().await.get(conversation_id).cloned()
    }
}

impl Default for MemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get_or_create(&self, id: Option<&str>) -> Conversation {
        let conversation_id = id
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Some(existing) = self.entry(&conversation_id).await {
            return existing.lock().await.clone();
        }

        let mut conversations = self.conversations.write().await;
        // A concurrent request may have created it between the two locks.
        let entry = conversations
            .entry(conversation_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new(conversation_id))))
            .clone();
        drop(conversations);

        let result = entry.lock().await.clone();
        result
    }

    async fn append(&self, conversation_id: &str, message: Message) -> Result<Message, RelayError> {
        let entry = self
            .entry(conversation_id).await
            .ok_or_else(|| RelayError::NotFound(conversation_id.to_string()))?;

        let mut conversation = entry.lock().await;
        conversation.messages.push(message.clone());
        conversation.updated_at = Utc::now();
        Ok(message)
    }

    async fn get(&self, conversation_id: &str) -> Option<Conversation> {
        let entry = self.entry(conversation_id).await?;
        let conversation = entry.lock().await;
        Some(conversation.clone())
    }

    async fn list(&self) -> Vec<ConversationSummary> {
        let conversations = self.conversations.read().await;
        let entries: Vec<Arc<Mutex<Conversation>>> = conversations.values().cloned().collect();
        drop(conversations);

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            summaries.push(entry.lock().await.summary());
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        summaries
    }

    async fn delete(&self, conversation_id: &str) -> bool {
        self.conversations.write().await.remove(conversation_id).is_some()
    }

    async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }
}
