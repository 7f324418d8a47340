//! Query engine - retrieval plus streamed generation over one persisted index

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use super::prompt::{join_context, render_qa_prompt, QA_PROMPT_TEMPLATE};
use crate::core::error::{DocuchatError, Result};
use crate::core::interrupt::CancelToken;
use crate::core::paths::STAGING_DIR;
use crate::index::embedding::Embedder;
use crate::index::vectordb::{ScoredChunk, VectorStore, META_MODEL};
use crate::llm::{ChatModel, TokenStream};

/// An answer being generated, plus the chunks it was grounded on.
pub struct StreamingResponse {
    pub source_chunks: Vec<ScoredChunk>,
    tokens: TokenStream,
}

impl StreamingResponse {
    pub fn new(source_chunks: Vec<ScoredChunk>, tokens: TokenStream) -> Self {
        Self {
            source_chunks,
            tokens,
        }
    }

    /// Write each chunk as it arrives (cyan) and return the full answer.
    ///
    /// Consumes the stream; stops with `Interrupted` once `cancel` fires.
    /// Waiting for the next chunk is a blocking section of `cancel`.
    pub fn print_response_stream<W: Write>(mut self, out: &mut W, cancel: &CancelToken) -> Result<String> {
        let mut answer = String::new();
        loop {
            cancel.check()?;
            let next = {
                let _blocking = cancel.blocking();
                self.tokens.next()
            };
            let Some(token) = next else {
                break;
            };
            let token = token?;
            write!(out, "{}", token.as_str().cyan())?;
            out.flush()?;
            answer.push_str(&token);
        }
        Ok(answer)
    }
}

impl Iterator for StreamingResponse {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.tokens.next()
    }
}

pub struct QueryEngine {
    indexes_root: PathBuf,
    embedder: Arc<dyn Embedder>,
    chat: Box<dyn ChatModel>,
    top_k: usize,
}

impl QueryEngine {
    pub fn new(
        indexes_root: impl Into<PathBuf>,
        embedder: Arc<dyn Embedder>,
        chat: Box<dyn ChatModel>,
        top_k: usize,
    ) -> Self {
        Self {
            indexes_root: indexes_root.into(),
            embedder,
            chat,
            top_k,
        }
    }

    /// Answer `question` from the index named `document`.
    pub fn query(&self, question: &str, document: &str) -> Result<StreamingResponse> {
        let store = self.open_index(document)?;

        let query_embedding = self.embedder.embed(question)?;
        let source_chunks = store.search(&query_embedding, self.top_k)?;
        tracing::debug!(
            document,
            retrieved = source_chunks.len(),
            scores = ?source_chunks.iter().map(|c| c.score).collect::<Vec<_>>(),
            "retrieved context"
        );

        let context = join_context(source_chunks.iter().map(|c| c.text.as_str()));
        let prompt = render_qa_prompt(QA_PROMPT_TEMPLATE, &context, question);
        let tokens = self.chat.stream_chat(&prompt)?;

        Ok(StreamingResponse::new(source_chunks, tokens))
    }

    fn open_index(&self, document: &str) -> Result<VectorStore> {
        // Names are plain directory names under the index root.
        let is_plain_name = !matches!(document, "" | "." | ".." | STAGING_DIR)
            && !document.contains(&['/', '\\'][..]);
        if !is_plain_name {
            return Err(DocuchatError::IndexNotFound(document.to_string()));
        }

        let dir = self.indexes_root.join(document);
        if !dir.is_dir() {
            return Err(DocuchatError::IndexNotFound(document.to_string()));
        }

        let store = VectorStore::open_read_only(&dir, document)?;
        let expected = self.embedder.model_id();
        match store.get_meta(META_MODEL)? {
            Some(found) if found != expected => Err(DocuchatError::EmbeddingMismatch {
                name: document.to_string(),
                found,
                expected,
            }),
            _ => Ok(store),
        }
    }
}
