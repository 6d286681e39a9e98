//! Core chat components
//!
//! The chat engine composes text generation with file-backed conversation storage.

mod chat;
mod store;

pub use chat::{ChatEngine, ChatError, GenerateRequest, GenerateResponse};
pub use store::ChatStore;
