use std::time::Instant;

use futures::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{self, ChatRequest, ErrorResponse};
use crate::errors::{ChatError, ChatResult};
use crate::models::conversation::Conversation;
use crate::models::message::{Message, MessageMetadata};
use crate::providers::openai::delta_text;
use crate::streaming::decode::StreamDecoder;
use crate::streaming::frame::{self, StreamFrame};

/// Cumulative snapshot of one assistant message, published after every
/// delta so a renderer can repaint without tracking increments itself.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageUpdate {
    pub message_id: String,
    pub content: String,
}

/// Streaming client for a relay endpoint.
///
/// `send_message` appends the user turn to a conversation, posts the full
/// history, and folds the streamed deltas into a single assistant message
/// in place. Whatever content has arrived stays on the conversation even
/// when the stream ends in an error or a cancellation.
pub struct ChatClient {
    http: Client,
    endpoint: String,
    provider: String,
    model: String,
    temperature: f32,
    updates: Option<mpsc::UnboundedSender<MessageUpdate>>,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        ChatClient {
            http: Client::new(),
            endpoint: endpoint.into(),
            provider: api::DEFAULT_PROVIDER.to_string(),
            model: api::DEFAULT_MODEL.to_string(),
            temperature: api::DEFAULT_TEMPERATURE,
            updates: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Registers a channel that receives a cumulative update per delta.
    pub fn with_updates(mut self, updates: mpsc::UnboundedSender<MessageUpdate>) -> Self {
        self.updates = Some(updates);
        self
    }

    /// Sends `text` as the next user turn and streams the reply into the
    /// conversation. Returns once the relay closes the stream. Input that
    /// is blank after trimming is a no-op.
    pub async fn send_message(
        &self,
        conversation: &mut Conversation,
        text: impl Into<String>,
        cancel: &CancellationToken,
    ) -> ChatResult<()> {
        if cancel.is_cancelled() {
            return Err(ChatError::Cancelled);
        }
        let text = text.into();
        if text.trim().is_empty() {
            return Ok(());
        }

        conversation.push(Message::user(text));
        let request = ChatRequest {
            messages: conversation.messages.iter().map(Into::into).collect(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
        };

        let started = Instant::now();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            result = self.http.post(&self.endpoint).json(&request).send() => result?,
        };

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Rejected(rejection_detail(&body)));
        }

        conversation.push(Message::assistant("").with_metadata(MessageMetadata {
            provider: Some(self.provider.clone()),
            model: Some(self.model.clone()),
            ..Default::default()
        }));
        let message_id = conversation
            .last_mut()
            .map(|message| message.id.clone())
            .unwrap_or_default();

        let mut stream = response.bytes_stream();
        let mut decoder = StreamDecoder::new();
        let mut buffer = String::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ChatError::Cancelled),
                next = stream.next() => next,
            };
            let Some(chunk) = next else { break };
            buffer.push_str(&decoder.feed(&chunk?));
            while let Some(line_end) = buffer.find('\n') {
                let line: String = buffer.drain(..=line_end).collect();
                self.handle_line(&line, conversation, &message_id)?;
            }
        }

        // The relay does not promise a trailing newline on the last frame.
        buffer.push_str(&decoder.finish());
        if !buffer.trim().is_empty() {
            let line = std::mem::take(&mut buffer);
            self.handle_line(&line, conversation, &message_id)?;
        }

        if let Some(metadata) = find_mut(conversation, &message_id)
            .and_then(|message| message.metadata.as_mut())
        {
            metadata.duration_ms = Some(started.elapsed().as_millis() as u64);
        }
        conversation.touch();
        Ok(())
    }

    fn handle_line(
        &self,
        line: &str,
        conversation: &mut Conversation,
        message_id: &str,
    ) -> ChatResult<()> {
        match frame::parse_line(line) {
            Some(StreamFrame::Chunk(chunk)) => {
                if let Some(delta) = delta_text(&chunk).filter(|delta| !delta.is_empty()) {
                    if let Some(message) = find_mut(conversation, message_id) {
                        message.content.push_str(delta);
                        self.publish(message);
                    }
                }
            }
            // [DONE] marks upstream completion but the relay owns the
            // connection; keep reading until it closes.
            Some(StreamFrame::Done) => {}
            Some(StreamFrame::RelayError(detail)) => return Err(ChatError::Upstream(detail)),
            None => {}
        }
        Ok(())
    }

    fn publish(&self, message: &Message) {
        if let Some(updates) = &self.updates {
            let _ = updates.send(MessageUpdate {
                message_id: message.id.clone(),
                content: message.content.clone(),
            });
        }
    }
}

fn find_mut<'a>(conversation: &'a mut Conversation, id: &str) -> Option<&'a mut Message> {
    conversation
        .messages
        .iter_mut()
        .rev()
        .find(|message| message.id == id)
}

/// Best-effort extraction of a failure detail from a rejection body.
fn rejection_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        if !parsed.error.trim().is_empty() {
            return parsed.error;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}
