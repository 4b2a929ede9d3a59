use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };

use crate::models::chat::{ ConversationSummary, Message };

/// Successful relay response for both POST endpoints.
///
/// `message_count` is only populated by the per-conversation variant.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub response: String,
    pub conversation_id: String,
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
    #[serde(rename = "rateLimit")]
    pub rate_limit: RateLimitInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub remaining: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetail {
    pub id: String,
    pub message_count: usize,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetConversationResponse {
    pub success: bool,
    pub conversation: ConversationDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub success: bool,
    pub count: usize,
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteConversationResponse {
    pub success: bool,
    pub message: String,
    pub conversation_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
    pub conversations_count: usize,
    pub memory_usage: serde_json::Value,
}
