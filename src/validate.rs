use serde_json::Value;

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Checks an inbound relay payload and collects every violated rule.
///
/// The payload arrives as a raw `serde_json::Value` so that a wrongly typed
/// field reports its type error rather than looking absent. An empty vec
/// means the payload is valid.
pub fn validate_webhook_input(payload: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    match payload.get("message") {
        None | Some(Value::Null) => {
            errors.push("message field is required".to_string());
        }
        Some(Value::String(message)) => {
            if message.trim().is_empty() {
                errors.push("message must not be empty".to_string());
            } else if message.chars().count() > MAX_MESSAGE_CHARS {
                errors.push(format!("message must not exceed {} characters", MAX_MESSAGE_CHARS));
            }
        }
        Some(_) => {
            errors.push("message must be a string".to_string());
        }
    }

    if let Some(conversation_id) = payload.get("conversation_id") {
        if !conversation_id.is_null() && !conversation_id.is_string() {
            errors.push("conversation_id must be a string".to_string());
        }
    }

    errors
}
