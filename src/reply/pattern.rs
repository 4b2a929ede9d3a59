use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;

use crate::error::RelayError;
use crate::models::chat::Message;
use crate::reply::ReplyGenerator;

const HELP_TEXT: &str = "I can help you with:\n\
    - General questions\n\
    - Conversation\n\
    - Information lookup\n\
    - Simple calculations\n\
    \nWhat would you like me to do?";

const DEFAULT_REPLIES: [&str; 4] = [
    "I'm thinking about \"{message}\"... That's an interesting topic!",
    "Understood. Could you tell me more about \"{message}\"?",
    "Great question! Let me try to help you with \"{message}\".",
    "\"{message}\" - could you ask something more specific about that?",
];

/// Local stand-in reply source: keyword matching plus basic arithmetic.
/// No model is involved; this is the non-networked fallback path.
pub struct PatternReplyGenerator {
    math: Regex,
}

impl PatternReplyGenerator {
    pub fn new() -> Self {
        Self {
            math: Regex::new(r"(\d+)\s*([-+*/])\s*(\d+)").expect("valid math pattern"),
        }
    }

    fn answer_math(&self, message: &str) -> Option<String> {
        let captures = self.math.captures(message)?;
        let a: f64 = captures[1].parse().ok()?;
        let operator = &captures[2];
        let b: f64 = captures[3].parse().ok()?;

        let result = match operator {
            "+" => (a + b).to_string(),
            "-" => (a - b).to_string(),
            "*" => (a * b).to_string(),
            "/" if b != 0.0 => (a / b).to_string(),
            "/" => "Division by zero error".to_string(),
            _ => return None,
        };

        Some(format!("{} {} {} = {}", a, operator, b, result))
    }
}

impl Default for PatternReplyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyGenerator for PatternReplyGenerator {
    async fn generate(
        &self,
        _conversation_id: &str,
        message: &str,
        _history: &[Message]
    ) -> Result<String, RelayError> {
        let lower = message.to_lowercase();

        if lower.contains("hello") || lower.contains("hey") {
            return Ok("Hello! How can I help you?".to_string());
        }

        if lower.contains("how are you") {
            return Ok("I'm an AI assistant, I'm always doing well! How can I help you?".to_string());
        }

        if lower.contains("weather") {
            return Ok(
                "Weather information needs an external API integration. That feature is not active right now.".to_string()
            );
        }

        if lower.contains("time") || lower.contains("clock") {
            return Ok(format!("The current time is: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")));
        }

        if lower.contains("help") {
            return Ok(HELP_TEXT.to_string());
        }

        if let Some(answer) = self.answer_math(message) {
            return Ok(answer);
        }

        // No RNG in the hot path: rotate the canned replies off the message.
        let index = message.chars().count() % DEFAULT_REPLIES.len();
        Ok(DEFAULT_REPLIES[index].replace("{message}", message))
    }
}
