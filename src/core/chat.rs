//! Chat engine
//!
//! Composes the generation provider with the conversation store:
//! 1. Validates the prompt
//! 2. Asks the provider for a response
//! 3. Appends the exchange to the conversation (or starts a new one)
//! 4. Returns the generated text and the conversation id

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::conversation::{ChatSummary, Conversation};
use crate::providers::{GenerationError, Generator};

use super::store::{ChatStore, StoreError};

/// Request to generate a response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// The user's prompt, possibly carrying a category tag
    #[serde(default)]
    pub prompt: String,

    /// Conversation to continue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

/// Generated text and the conversation it was stored in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub text: String,
    pub id: String,
}

/// Errors from the chat engine
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Prompt is required")]
    EmptyPrompt,

    #[error("Chat not found: {0}")]
    NotFound(String),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

pub struct ChatEngine {
    generator: Arc<dyn Generator>,
    store: ChatStore,
}

impl ChatEngine {
    pub fn new(generator: Arc<dyn Generator>, store: ChatStore) -> Self {
        Self { generator, store }
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// Generate a response and record the exchange.
    ///
    /// A blank prompt is rejected before the provider is called. An unknown `chat_id`
    /// starts a new conversation.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, ChatError> {
        if request.prompt.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }

        let text = self.generator.generate(&request.prompt).await?;

        let conversation = self
            .store
            .append_or_create(request.chat_id.as_deref(), &request.prompt, &text)
            .await?;

        tracing::info!(
            "Chat {} now has {} message(s)",
            conversation.id,
            conversation.messages.len()
        );

        Ok(GenerateResponse {
            text,
            id: conversation.id,
        })
    }

    pub async fn list_conversations(&self) -> Result<Vec<ChatSummary>, ChatError> {
        Ok(self.store.list().await?)
    }

    pub async fn get_conversation(&self, id: &str) -> Result<Conversation, ChatError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ChatError::NotFound(id.to_string()))
    }

    /// Remove every conversation. `None` means there was no storage directory yet.
    pub async fn clear_all(&self) -> Result<Option<usize>, ChatError> {
        Ok(self.store.delete_all().await?)
    }
}
