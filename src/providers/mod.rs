//! Text generation providers

mod gemini;
mod ollama;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No candidates in response")]
    NoCandidates,
}

/// Turns a prompt into generated text with a single upstream call
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub enum Provider {
    Gemini(GeminiProvider),
    Ollama(OllamaProvider),
}

impl Provider {
    pub fn from_name(name: &str, config: &Config) -> Result<Self, GenerationError> {
        match name.to_lowercase().as_str() {
            "gemini" | "google" => {
                let api_key = config
                    .google_api_key
                    .clone()
                    .ok_or_else(|| GenerationError::NotConfigured("GOOGLE_API_KEY".into()))?;
                Ok(Provider::Gemini(GeminiProvider::new(
                    config.gemini_base_url.clone(),
                    config.gemini_model.clone(),
                    api_key,
                )))
            }
            "ollama" => Ok(Provider::Ollama(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))),
            _ => Err(GenerationError::UnknownProvider(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini(_) => "gemini",
            Provider::Ollama(_) => "ollama",
        }
    }
}

#[async_trait]
impl Generator for Provider {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self {
            Provider::Gemini(p) => p.generate(prompt).await,
            Provider::Ollama(p) => p.generate(prompt).await,
        }
    }
}
