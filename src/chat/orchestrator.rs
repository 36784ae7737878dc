use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::error::ChatError;
use super::events::{ChatEvent, EventSink};
use crate::context::PromptAssembler;
use crate::core::config::{ChatSettings, LlmSettings};
use crate::history::{ChatTurn, HistoryStore};
use crate::llm::{ChatRequest, CompletionClient, Role};
use crate::rag::ContextRetriever;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub session_id: String,
    pub message: String,
}

/// Runs one chat exchange: persist the user turn, window the history, ground
/// the prompt in retrieved articles, call the model, persist the reply.
#[derive(Clone)]
pub struct ChatOrchestrator {
    history: HistoryStore,
    retriever: ContextRetriever,
    prompts: PromptAssembler,
    client: Arc<dyn CompletionClient>,
    model: String,
    max_tokens: u32,
    temperature: Option<f64>,
    history_limit: i64,
}

impl ChatOrchestrator {
    pub fn new(
        history: HistoryStore,
        retriever: ContextRetriever,
        client: Arc<dyn CompletionClient>,
        llm: &LlmSettings,
        chat: &ChatSettings,
    ) -> Self {
        Self {
            history,
            retriever,
            prompts: PromptAssembler::new(chat.persona.as_str()),
            client,
            model: llm.model.clone(),
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            history_limit: chat.history_limit,
        }
    }

    async fn prepare(&self, session_id: &str, message: &str) -> Result<ChatRequest, ChatError> {
        self.history
            .add_turn(session_id, Role::User, message)
            .await
            .map_err(ChatError::Persistence)?;

        let messages = self
            .history
            .recent_turns(session_id, self.history_limit)
            .await
            .map_err(ChatError::Persistence)?
            .iter()
            .map(ChatTurn::to_message)
            .collect();

        let context = self
            .retriever
            .build_context(message)
            .await
            .map_err(ChatError::Retrieval)?;

        Ok(ChatRequest::new(&self.model, messages, self.max_tokens)
            .with_system(self.prompts.assemble(&context))
            .with_temperature(self.temperature))
    }

    pub async fn chat(&self, session_id: &str, message: &str) -> Result<ChatReply, ChatError> {
        let request = self.prepare(session_id, message).await?;

        let reply = self
            .client
            .complete(request)
            .await
            .map_err(ChatError::Completion)?;

        self.history
            .add_turn(session_id, Role::Assistant, &reply)
            .await
            .map_err(ChatError::Persistence)?;

        Ok(ChatReply {
            session_id: session_id.to_string(),
            message: reply,
        })
    }

    /// Prepares the exchange, then relays the model output on the returned
    /// receiver from a background task.
    ///
    /// Failures before the upstream call are returned directly. Later ones
    /// arrive as a single `error` event.
    pub async fn chat_stream(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<mpsc::UnboundedReceiver<ChatEvent>, ChatError> {
        let request = self.prepare(session_id, message).await?;
        let (sink, events) = EventSink::channel();

        let orchestrator = self.clone();
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            orchestrator.relay(session_id, request, sink).await;
        });

        Ok(events)
    }

    async fn relay(self, session_id: String, request: ChatRequest, sink: EventSink) {
        let mut upstream = match self.client.stream(request).await {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::warn!("Failed to open {} stream: {}", self.client.name(), e);
                sink.fail(ChatError::Completion(e).to_string());
                return;
            }
        };

        let mut reply = String::new();
        loop {
            let item = tokio::select! {
                item = upstream.recv() => item,
                _ = sink.closed() => {
                    tracing::info!("Client left session {} mid-stream; reply discarded", session_id);
                    return;
                }
            };

            match item {
                Some(Ok(fragment)) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    reply.push_str(&fragment);
                    if sink.delta(fragment).is_err() {
                        tracing::info!("Client left session {} mid-stream; reply discarded", session_id);
                        return;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("Completion stream failed for session {}: {}", session_id, e);
                    sink.fail(ChatError::Completion(e).to_string());
                    return;
                }
                None => break,
            }
        }

        if sink.is_closed() {
            tracing::info!("Client left session {} before completion; reply discarded", session_id);
            return;
        }

        match self
            .history
            .add_turn(&session_id, Role::Assistant, &reply)
            .await
        {
            Ok(_) => sink.done(),
            Err(e) => {
                let err = ChatError::Persistence(e);
                tracing::error!("{}", err);
                sink.fail("Failed to save the assistant reply");
            }
        }
    }
}
