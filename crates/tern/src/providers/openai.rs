use serde::{Deserialize, Serialize};

use crate::api::ChatMessage;

pub const OPENAI_HOST: &str = "https://api.openai.com";

/// Joins a provider host and the chat-completions path, tolerating a
/// trailing slash on the configured host.
pub fn completions_url(host: &str) -> String {
    format!("{}/v1/chat/completions", host.trim_end_matches('/'))
}

/// Request body for the upstream chat-completions call. Always streamed.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionPayload {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub stream: bool,
}

impl CompletionPayload {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, temperature: f32) -> Self {
        CompletionPayload {
            model: model.into(),
            messages,
            temperature,
            stream: true,
        }
    }
}

/// One parsed SSE chunk from the completions stream. Fields we do not
/// consume (id, object, usage) are ignored on deserialize.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Extracts the text delta from a chunk, if the chunk carries one.
/// Role-only chunks and the final finish_reason chunk yield None.
pub fn delta_text(chunk: &ChatChunk) -> Option<&str> {
    chunk
        .choices
        .first()
        .and_then(|choice| choice.delta.content.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completions_url_joins_path() {
        assert_eq!(
            completions_url("https://api.openai.com"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://api.openai.com/"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_payload_always_streams() {
        let payload = CompletionPayload::new("gpt-4o-mini", vec![], 0.7);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["stream"], true);
        assert_eq!(value["model"], "gpt-4o-mini");
        let temperature = value["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_delta_text_from_content_chunk() {
        let chunk: ChatChunk = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": "Hello"}, "finish_reason": null}]
        }))
        .unwrap();
        assert_eq!(delta_text(&chunk), Some("Hello"));
    }

    #[test]
    fn test_delta_text_skips_role_only_chunk() {
        let chunk: ChatChunk = serde_json::from_value(json!({
            "choices": [{"delta": {"role": "assistant"}, "finish_reason": null}]
        }))
        .unwrap();
        assert_eq!(delta_text(&chunk), None);
    }

    #[test]
    fn test_delta_text_with_no_choices() {
        let chunk: ChatChunk = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(delta_text(&chunk), None);
    }

    #[test]
    fn test_finish_chunk_parses() {
        let chunk: ChatChunk = serde_json::from_value(json!({
            "choices": [{"delta": {}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(delta_text(&chunk), None);
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
    }
}
