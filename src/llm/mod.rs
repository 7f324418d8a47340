//! Language-model access

pub mod openai;
pub mod sse;

pub use openai::{OpenAiChat, OpenAiClient, OpenAiEmbedder};

use crate::core::error::Result;

/// Lazy, finite, non-restartable stream of answer text.
pub type TokenStream = Box<dyn Iterator<Item = Result<String>> + Send>;

pub trait ChatModel {
    /// Send `prompt` as a single user message and stream the reply.
    fn stream_chat(&self, prompt: &str) -> Result<TokenStream>;
}
