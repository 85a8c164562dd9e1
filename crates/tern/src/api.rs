use serde::{Deserialize, Serialize};

use crate::models::message::{Message, Role};

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One history entry as it travels over the relay wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// The request body accepted by the relay endpoint.
///
/// Omitted optional fields deserialize to their defaults, so equivalent
/// requests produce an identical payload on the upstream leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

/// JSON body of a relay rejection (400/500).
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_applied_for_omitted_fields() {
        let request: ChatRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();

        assert_eq!(request.provider, "openai");
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.messages[0].role, Role::User);
    }

    #[test]
    fn test_explicit_fields_win() {
        let request: ChatRequest = serde_json::from_value(json!({
            "messages": [{"role": "system", "content": "be brief"}],
            "provider": "anthropic",
            "model": "claude-3-5-sonnet-20241022",
            "temperature": 0.2
        }))
        .unwrap();

        assert_eq!(request.provider, "anthropic");
        assert_eq!(request.model, "claude-3-5-sonnet-20241022");
        assert_eq!(request.temperature, 0.2);
    }

    #[test]
    fn test_round_trip_is_stable() {
        let request = ChatRequest::new(vec![ChatMessage {
            role: Role::User,
            content: "hello".to_string(),
        }]);

        let reparsed: ChatRequest =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(reparsed, request);
    }

    #[test]
    fn test_chat_message_from_model_message() {
        let message = Message::assistant("done");
        let wire = ChatMessage::from(&message);
        assert_eq!(wire.role, Role::Assistant);
        assert_eq!(wire.content, "done");
    }
}
