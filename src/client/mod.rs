//! Chat client
//!
//! A terminal rendition of the browser UI: a category picker, then a chat workspace that
//! talks to the backend over HTTP.

mod api;
pub mod repl;
pub mod state;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::{ChatSummary, Conversation};
use crate::core::{GenerateRequest, GenerateResponse};

pub use api::ChatApi;
pub use state::{Category, ClientState};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server error {0}: {1}")]
    Status(u16, String),

    #[error("Another request is in flight")]
    Busy,
}

/// The four backend operations the client uses
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ClientError>;
    async fn list_chats(&self) -> Result<Vec<ChatSummary>, ClientError>;
    async fn get_chat(&self, id: &str) -> Result<Conversation, ClientError>;
    async fn clear_chats(&self) -> Result<(), ClientError>;
}

/// Client state bound to a backend; every transition that needs the server lives here
pub struct ChatSession<B> {
    backend: B,
    state: ClientState,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: ClientState::new(),
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ClientState {
        &mut self.state
    }

    /// Reload the conversation list; failures leave the old list in place
    pub async fn refresh_chats(&mut self) {
        match self.backend.list_chats().await {
            Ok(chats) => self.state.chats = chats,
            Err(e) => tracing::error!("Failed to load chats: {}", e),
        }
    }

    pub async fn load_chat(&mut self, id: &str) -> Result<(), ClientError> {
        if self.state.loading {
            return Err(ClientError::Busy);
        }
        self.state.loading = true;
        let result = self.backend.get_chat(id).await;
        self.state.loading = false;

        let conversation = result.map_err(|e| {
            tracing::error!("Failed to load chat {}: {}", id, e);
            e
        })?;
        self.state.show_conversation(conversation.id, conversation.messages);
        Ok(())
    }

    /// Send the current prompt. Returns `Ok(false)` when there was nothing to send.
    pub async fn submit(&mut self) -> Result<bool, ClientError> {
        if self.state.loading {
            return Err(ClientError::Busy);
        }
        let Some(prompt) = self.state.outgoing_prompt() else {
            return Ok(false);
        };

        let request = GenerateRequest {
            prompt,
            chat_id: self.state.current_chat_id.clone(),
        };

        self.state.loading = true;
        let result = self.backend.generate(&request).await;
        self.state.loading = false;

        let response = result.map_err(|e| {
            tracing::error!("Error submitting prompt: {}", e);
            e
        })?;

        self.state.current_chat_id = Some(response.id.clone());
        // The reply is already stored; a failed reload only leaves the view stale
        let _ = self.load_chat(&response.id).await;
        self.refresh_chats().await;
        self.state.prompt.clear();
        Ok(true)
    }

    /// Delete every conversation on the server. Callers confirm with the user first.
    pub async fn clear_all(&mut self) -> Result<(), ClientError> {
        if self.state.loading {
            return Err(ClientError::Busy);
        }
        self.state.loading = true;
        let result = self.backend.clear_chats().await;
        self.state.loading = false;

        result.map_err(|e| {
            tracing::error!("Failed to clear chats: {}", e);
            e
        })?;
        self.state.reset();
        Ok(())
    }
}
