//! Application configuration

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory holding one JSON file per conversation
    pub storage_dir: PathBuf,
    /// Generation provider name: "gemini" or "ollama"
    pub provider: String,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4000,
            storage_dir: PathBuf::from("./chat-history"),
            provider: "gemini".into(),
            google_api_key: None,
            gemini_model: "gemini-1.5-flash-latest".into(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            ollama_url: "http://localhost:11434".into(),
            ollama_model: "llama3.2".into(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            storage_dir: lookup("CHAT_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            provider: lookup("GENERATION_PROVIDER").unwrap_or(defaults.provider),
            google_api_key: lookup("GOOGLE_API_KEY").filter(|k| !k.is_empty()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: lookup("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            ollama_url: lookup("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            ollama_model: lookup("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
        }
    }
}
