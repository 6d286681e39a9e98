//! HTTP client for the assistant backend

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::conversation::{ChatSummary, Conversation};
use crate::core::{GenerateRequest, GenerateResponse};

use super::{ChatBackend, ClientError};

pub struct ChatApi {
    client: Client,
    base_url: String,
}

impl ChatApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status(status.as_u16(), body));
    }
    Ok(response.json().await?)
}

#[async_trait]
impl ChatBackend for ChatApi {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>, ClientError> {
        let response = self.client.get(self.url("/api/chats")).send().await?;
        decode(response).await
    }

    async fn get_chat(&self, id: &str) -> Result<Conversation, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/chats/{}", id)))
            .send()
            .await?;
        decode(response).await
    }

    async fn clear_chats(&self) -> Result<(), ClientError> {
        let response = self.client.delete(self.url("/api/chats")).send().await?;
        decode::<serde_json::Value>(response).await.map(|_| ())
    }
}
