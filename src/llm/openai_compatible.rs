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

/// Client for servers speaking the OpenAI chat-completions dialect
/// (LM Studio, Ollama, vLLM, ...).
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    async fn post_completions(&self, body: &Value) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut builder = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let res = builder.send().await.map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!("Chat completion error: {}", text)));
        }

        Ok(res)
    }
}

fn request_body(request: &ChatRequest, stream: bool) -> Value {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = &request.system {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.extend(
        request
            .messages
            .iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content})),
    );

    let mut body = json!({
        "model": request.model,
        "messages": messages,
        "max_tokens": request.max_tokens,
        "stream": stream,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature {
            obj.insert("temperature".to_string(), json!(t));
        }
    }

    body
}

/// `Some(None)` marks the end of the stream; `None` is a chunk to skip.
fn parse_chunk(data: &str) -> Option<Option<String>> {
    if data == "[DONE]" {
        return Some(None);
    }
    let json = serde_json::from_str::<Value>(data).ok()?;
    let content = json["choices"][0]["delta"]["content"].as_str()?;
    Some(Some(content.to_string()))
}

/// Returns `false` once the relay should stop.
async fn forward_line(tx: &mpsc::Sender<Result<String, ApiError>>, line: &str) -> bool {
    let Some(data) = data_payload(line.trim()) else {
        return true;
    };
    match parse_chunk(data) {
        Some(Some(content)) => content.is_empty() || tx.send(Ok(content)).await.is_ok(),
        Some(None) => false,
        None => true,
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ApiError> {
        let res = self.post_completions(&request_body(&request, false)).await?;
        let payload: Value = res.json().await.map_err(ApiError::upstream)?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }

    async fn stream(&self, request: ChatRequest) -> Result<CompletionStream, ApiError> {
        let res = self.post_completions(&request_body(&request, true)).await?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(relay_stream(res.bytes_stream(), tx));

        Ok(rx)
    }
}

/// Turns a chat-completions SSE body into text fragments on `tx`, stopping
/// at `[DONE]`.
async fn relay_stream<S, B, E>(body: S, tx: mpsc::Sender<Result<String, ApiError>>)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut body = pin!(body);
    let mut lines = SseLineBuffer::new();

    while let Some(item) = body.next().await {
        match item {
            Ok(bytes) => {
                for line in lines.push(bytes.as_ref()) {
                    if !forward_line(&tx, &line).await {
                        return;
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(Err(ApiError::upstream(e))).await;
                return;
            }
        }
    }

    if let Some(line) = lines.finish() {
        forward_line(&tx, &line).await;
    }
}
