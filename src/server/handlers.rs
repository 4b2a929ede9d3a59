use std::net::SocketAddr;

use axum::{
    extract::{ rejection::JsonRejection, ConnectInfo, Path, Request, State },
    http::{ StatusCode, Uri },
    middleware::Next,
    response::{ IntoResponse, Response },
    Json,
};
use chrono::Utc;
use log::{ error, info };
use serde_json::{ json, Value };

use crate::error::RelayError;
use crate::models::api::{
    ConversationDetail,
    DeleteConversationResponse,
    GetConversationResponse,
    HealthResponse,
    ListConversationsResponse,
    RateLimitInfo,
    WebhookResponse,
};
use crate::models::chat::Message;
use crate::server::AppState;
use crate::validate::validate_webhook_input;

/// POST /webhook — relays a chat message, creating the conversation if needed.
pub async fn relay_webhook(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: Result<Json<Value>, JsonRejection>
) -> Response {
    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return invalid_json(rejection);
        }
    };

    let errors = validate_webhook_input(&payload);
    if !errors.is_empty() {
        return validation_failed(errors);
    }

    let rate = state.limiter.check(&peer.ip().to_string());
    if !rate.allowed {
        return rate_limited(rate.reset_in.unwrap_or_default());
    }

    let conversation_id = payload.get("conversation_id").and_then(Value::as_str);
    let conversation = state.store.get_or_create(conversation_id).await;

    match relay_message(&state, &conversation.id, &payload, rate.remaining, false).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Webhook relay error: {}", e);
            internal_error(&e, state.development)
        }
    }
}

/// POST /webhook/conversation/{id} — same relay, but only for a known conversation.
pub async fn relay_to_conversation(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>
) -> Response {
    if state.store.get(&id).await.is_none() {
        return conversation_not_found(Some(&id));
    }

    let Json(payload) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return invalid_json(rejection);
        }
    };

    // The path supplies the conversation id; a body-level one is ignored.
    let gate_input = json!({ "message": payload.get("message"), "conversation_id": id });
    let errors = validate_webhook_input(&gate_input);
    if !errors.is_empty() {
        return validation_failed(errors);
    }

    let rate = state.limiter.check(&peer.ip().to_string());
    if !rate.allowed {
        return rate_limited(rate.reset_in.unwrap_or_default());
    }

    match relay_message(&state, &id, &payload, rate.remaining, true).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        // The conversation can be deleted while the reply is in flight.
        Err(RelayError::NotFound(_)) => conversation_not_found(Some(&id)),
        Err(e) => {
            error!("Conversation relay error: {}", e);
            internal_error(&e, state.development)
        }
    }
}

/// Shared relay flow: append the user message, generate a reply, append it.
async fn relay_message(
    state: &AppState,
    conversation_id: &str,
    payload: &Value,
    remaining: u32,
    include_count: bool
) -> Result<WebhookResponse, RelayError> {
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    let metadata = payload
        .get("metadata")
        .filter(|m| !m.is_null())
        .cloned();

    state.store.append(conversation_id, Message::user(message.as_str(), metadata)).await?;

    let conversation = state.store
        .get(conversation_id).await
        .ok_or_else(|| RelayError::NotFound(conversation_id.to_string()))?;

    let reply_text = state.generator
        .generate(conversation_id, &message, &conversation.messages).await?;

    let assistant_message = state.store
        .append(conversation_id, Message::assistant(reply_text.as_str())).await?;

    let total_messages = conversation.messages.len() + 1;
    info!("Message processed: {} ({} messages)", conversation_id, total_messages);

    Ok(WebhookResponse {
        success: true,
        response: reply_text,
        conversation_id: conversation_id.to_string(),
        message_id: assistant_message.id,
        timestamp: assistant_message.timestamp,
        message_count: include_count.then_some(total_messages),
        rate_limit: RateLimitInfo { remaining },
    })
}

/// GET /webhook/conversation/{id} — full message history.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>
) -> Response {
    match state.store.get(&id).await {
        Some(conversation) => {
            let detail = ConversationDetail {
                id: conversation.id,
                message_count: conversation.messages.len(),
                messages: conversation.messages,
                created_at: conversation.created_at,
                updated_at: conversation.updated_at,
            };
            Json(GetConversationResponse {
                success: true,
                conversation: detail,
            }).into_response()
        }
        None => conversation_not_found(None),
    }
}

/// GET /webhook/conversations — summaries only.
pub async fn list_conversations(State(state): State<AppState>) -> Response {
    let conversations = state.store.list().await;
    Json(ListConversationsResponse {
        success: true,
        count: conversations.len(),
        conversations,
    }).into_response()
}

/// DELETE /webhook/conversation/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>
) -> Response {
    if !state.store.delete(&id).await {
        return conversation_not_found(None);
    }

    info!("Conversation deleted: {}", id);
    Json(DeleteConversationResponse {
        success: true,
        message: "Conversation deleted".to_string(),
        conversation_id: id,
    }).into_response()
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        conversations_count: state.store.len().await,
        memory_usage: memory_usage(),
    }).into_response()
}

pub async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Not found", "path": uri.path() })),
    ).into_response()
}

pub async fn log_request(request: Request, next: Next) -> Response {
    info!("{} {}", request.method(), request.uri().path());
    next.run(request).await
}

fn validation_failed(details: Vec<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": "Validation failed", "details": details })),
    ).into_response()
}

fn invalid_json(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(
            json!({ "success": false, "error": "Invalid JSON body", "details": [rejection.body_text()] })
        ),
    ).into_response()
}

fn rate_limited(reset_in: u64) -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "success": false, "error": "Rate limit exceeded", "resetIn": reset_in })),
    ).into_response()
}

fn conversation_not_found(id: Option<&str>) -> Response {
    let body = match id {
        Some(id) =>
            json!({ "success": false, "error": "Conversation not found", "conversation_id": id }),
        None => json!({ "success": false, "error": "Conversation not found" }),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn internal_error(e: &RelayError, development: bool) -> Response {
    let detail = if development {
        e.to_string()
    } else {
        "Something went wrong".to_string()
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "Internal server error", "message": detail })),
    ).into_response()
}

fn memory_usage() -> Value {
    #[cfg(target_os = "linux")]
    {
        // /proc/self/statm reports sizes in pages.
        if let Ok(statm) = std::fs::read_to_string("/proc/self/statm") {
            let mut fields = statm.split_whitespace();
            let vsz = fields.next().and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
            let rss = fields.next().and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
            const PAGE_SIZE: u64 = 4096;
            return json!({ "vsz": vsz * PAGE_SIZE, "rss": rss * PAGE_SIZE });
        }
    }

    json!({ "rss": 0 })
}
