//! Chat completion against an OpenAI-compatible endpoint

pub mod client;

use async_trait::async_trait;
pub use client::LlmService;

use crate::errors::Result;
pub use crate::models::ChatMessage;
pub use crate::models::Role;

/// Produces the assistant's reply to a prompt
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String>;
}
