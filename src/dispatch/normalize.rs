use chrono::{ DateTime, Utc };
use serde_json::{ Map, Value };

/// Reply text used when no recognized field is found in the payload.
pub const UNRECOGNIZED_REPLY: &str = "Sorry, I could not understand the response format.";

/// Canonical record produced from an arbitrary webhook payload.
///
/// Transient: the server re-wraps it into a stored message, it is never
/// persisted as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedReply {
    pub success: bool,
    pub text: String,
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Maps whatever JSON shape the automation endpoint returned onto a
/// `NormalizedReply`. Total: never fails, never panics.
///
/// The resolution order is a fixed priority policy, not key iteration:
/// `output` > `response` > `text` > string-valued `message` > bare string
/// payload > last element of a non-empty array > unrecognized fallback.
pub fn normalize_webhook_response(data: &Value, conversation_id: &str) -> NormalizedReply {
    if let Value::Object(fields) = data {
        for key in ["output", "response", "text"] {
            if let Some(text) = fields.get(key).and_then(Value::as_str) {
                return reply_from_object(text, fields, conversation_id);
            }
        }
        // `message` only counts when it is a string; a nested object here
        // falls through to the remaining rules.
        if let Some(text) = fields.get("message").and_then(Value::as_str) {
            return reply_from_object(text, fields, conversation_id);
        }
    }

    if let Value::String(text) = data {
        return NormalizedReply {
            success: true,
            text: text.clone(),
            conversation_id: Some(conversation_id.to_string()),
            message_id: None,
            timestamp: Utc::now(),
        };
    }

    // Multi-turn array payloads resolve to the last element only; earlier
    // elements are dropped, which downstream behavior depends on.
    if let Value::Array(elements) = data {
        if let Some(last) = elements.last() {
            return NormalizedReply {
                success: true,
                text: resolve_array_element(last),
                conversation_id: Some(conversation_id.to_string()),
                message_id: None,
                timestamp: Utc::now(),
            };
        }
    }

    NormalizedReply {
        success: false,
        text: UNRECOGNIZED_REPLY.to_string(),
        conversation_id: Some(conversation_id.to_string()),
        message_id: None,
        timestamp: Utc::now(),
    }
}

fn reply_from_object(
    text: &str,
    fields: &Map<String, Value>,
    fallback_conversation_id: &str
) -> NormalizedReply {
    let conversation_id = fields
        .get("conversation_id")
        .and_then(Value::as_str)
        .unwrap_or(fallback_conversation_id);

    let timestamp = fields
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    NormalizedReply {
        success: true,
        text: text.to_string(),
        conversation_id: Some(conversation_id.to_string()),
        message_id: fields.get("message_id").and_then(Value::as_str).map(str::to_owned),
        timestamp,
    }
}

/// Resolution inside the array branch uses its own field order.
fn resolve_array_element(element: &Value) -> String {
    if let Value::Object(fields) = element {
        for key in ["output", "message", "response", "text"] {
            if let Some(text) = fields.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
    }

    match element {
        // A bare string renders without JSON quoting.
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
