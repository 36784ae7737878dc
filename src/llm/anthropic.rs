use std::fmt;
use std::pin::pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::{CompletionClient, CompletionStream};
use super::sse::{data_payload, SseLineBuffer};
use super::types::ChatRequest;
use crate::core::errors::ApiError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct AnthropicProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    async fn post_messages(&self, body: &Value) -> Result<reqwest::Response, ApiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Upstream("Anthropic API key is not configured".to_string()))?;
        let url = format!("{}/v1/messages", self.base_url);

        let res = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Anthropic API error ({}): {}",
                status, text
            )));
        }

        Ok(res)
    }
}

/// What one `data:` payload of a Messages stream means to the relay.
#[derive(Debug, PartialEq)]
enum StreamSignal {
    Text(String),
    Stop,
    Failure(String),
    Skip,
}

fn request_body(request: &ChatRequest, stream: bool) -> Value {
    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "messages": request.messages,
        "stream": stream,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(system) = &request.system {
            obj.insert("system".to_string(), json!(system));
        }
        if let Some(t) = request.temperature {
            obj.insert("temperature".to_string(), json!(t));
        }
    }

    body
}

/// Only the first content block counts, and only if it is text.
fn first_text_block(payload: &Value) -> String {
    let block = &payload["content"][0];
    if block["type"].as_str() == Some("text") {
        block["text"].as_str().unwrap_or_default().to_string()
    } else {
        String::new()
    }
}

fn parse_stream_data(data: &str) -> StreamSignal {
    let Ok(event) = serde_json::from_str::<Value>(data) else {
        tracing::debug!("Skipping undecodable stream event: {}", data);
        return StreamSignal::Skip;
    };

    match event["type"].as_str() {
        Some("content_block_delta") if event["delta"]["type"].as_str() == Some("text_delta") => {
            StreamSignal::Text(event["delta"]["text"].as_str().unwrap_or_default().to_string())
        }
        Some("message_stop") => StreamSignal::Stop,
        Some("error") => StreamSignal::Failure(
            event["error"]["message"]
                .as_str()
                .unwrap_or("Anthropic stream error")
                .to_string(),
        ),
        _ => StreamSignal::Skip,
    }
}

#[async_trait]
impl CompletionClient for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ApiError> {
        let res = self.post_messages(&request_body(&request, false)).await?;
        let payload: Value = res.json().await.map_err(ApiError::upstream)?;
        Ok(first_text_block(&payload))
    }

    async fn stream(&self, request: ChatRequest) -> Result<CompletionStream, ApiError> {
        let res = self.post_messages(&request_body(&request, true)).await?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(relay_stream(res.bytes_stream(), tx));

        Ok(rx)
    }
}

/// Returns `false` once the relay should stop.
async fn forward_line(tx: &mpsc::Sender<Result<String, ApiError>>, line: &str) -> bool {
    let Some(data) = data_payload(line) else {
        return true;
    };
    match parse_stream_data(data) {
        StreamSignal::Text(text) => text.is_empty() || tx.send(Ok(text)).await.is_ok(),
        StreamSignal::Stop => false,
        StreamSignal::Failure(message) => {
            let _ = tx.send(Err(ApiError::Upstream(message))).await;
            false
        }
        StreamSignal::Skip => true,
    }
}

/// Turns a Messages SSE body into text fragments on `tx`. A body that ends
/// before `message_stop` is reported as an error.
async fn relay_stream<S, B, E>(body: S, tx: mpsc::Sender<Result<String, ApiError>>)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut body = pin!(body);
    let mut lines = SseLineBuffer::new();

    while let Some(item) = body.next().await {
        let bytes = match item {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send(Err(ApiError::upstream(e))).await;
                return;
            }
        };

        for line in lines.push(bytes.as_ref()) {
            if !forward_line(&tx, &line).await {
                return;
            }
        }
    }

    if let Some(line) = lines.finish() {
        if !forward_line(&tx, &line).await {
            return;
        }
    }

    let _ = tx
        .send(Err(ApiError::Upstream(
            "Anthropic stream ended before message_stop".to_string(),
        )))
        .await;
}
