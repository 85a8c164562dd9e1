use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    extract::State,
    http::{self, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use tern::api::{ChatRequest, ErrorResponse};
use tern::providers::openai::{completions_url, CompletionPayload};
use tern::streaming::decode::StreamDecoder;
use tern::streaming::frame::ERROR_PREFIX;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Streaming response that relays the upstream completion stream as plain
/// text. Once the 200 goes out, failures can only be reported in-band.
pub struct StreamResponse {
    rx: ReceiverStream<String>,
}

impl StreamResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for StreamResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for StreamResponse {
    fn into_response(self) -> axum::response::Response {
        let body = axum::body::Body::from_stream(self);

        http::Response::builder()
            .header("Content-Type", "text/plain; charset=utf-8")
            .header("Cache-Control", "no-cache, no-transform")
            .header("Access-Control-Allow-Origin", "*")
            .body(body)
            .unwrap()
    }
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<StreamResponse, (StatusCode, Json<ErrorResponse>)> {
    if request.messages.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, "No messages provided"));
    }
    if request.provider.to_lowercase() != "openai" {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Only openai provider implemented in demo",
        ));
    }
    let Some(api_key) = state.api_key.clone() else {
        return Err(reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            "OPENAI_API_KEY missing",
        ));
    };

    // Create channel for streaming
    let (tx, rx) = mpsc::channel(100);
    let cancel = state.shutdown.child_token();
    tokio::spawn(forward_upstream(state, api_key, request, tx, cancel));

    Ok(StreamResponse::new(ReceiverStream::new(rx)))
}

fn reject(status: StatusCode, detail: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: detail.to_string(),
        }),
    )
}

/// Proxies one completion request, pushing decoded upstream text into `tx`
/// verbatim. Establishment and transport failures become `ERROR:` frames.
async fn forward_upstream(
    state: AppState,
    api_key: String,
    request: ChatRequest,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    let payload = CompletionPayload::new(request.model, request.messages, request.temperature);
    let url = completions_url(&state.upstream_host);

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = state.http.post(&url).bearer_auth(&api_key).json(&payload).send() => result,
    };

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::error!("Upstream request failed: {}", err);
            let _ = tx.send(format!("{ERROR_PREFIX}{err}")).await;
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let text = response
            .text()
            .await
            .ok()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "unknown error".to_string());
        tracing::error!("Upstream returned {}: {}", status, text);
        let _ = tx.send(format!("{ERROR_PREFIX}{text}")).await;
        return;
    }

    let mut stream = response.bytes_stream();
    let mut decoder = StreamDecoder::new();
    let mut line_open = false;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = stream.next() => next,
        };
        let Some(chunk) = next else { break };
        match chunk {
            Ok(bytes) => {
                let text = decoder.feed(&bytes);
                if text.is_empty() {
                    continue;
                }
                line_open = !text.ends_with('\n');
                if tx.send(text).await.is_err() {
                    // Caller hung up; stop pulling from upstream.
                    return;
                }
            }
            Err(err) => {
                tracing::error!("Upstream stream failed: {}", err);
                // Keep the frame on its own line if a partial one went out.
                let newline = if line_open { "\n" } else { "" };
                let _ = tx.send(format!("{newline}{ERROR_PREFIX}{err}")).await;
                return;
            }
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        let _ = tx.send(tail).await;
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .with_state(state)
}
