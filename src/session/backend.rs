use std::sync::Arc;

use crate::core::config::{Config, EmbeddingBackend};
use crate::core::document::SourceDocument;
use crate::core::error::Result;
use crate::core::interrupt::CancelToken;
use crate::index::{Chunker, Embedder, HarmonicEmbedder, IndexSummary, Indexer, PdfLoader};
use crate::llm::{OpenAiChat, OpenAiClient, OpenAiEmbedder};
use crate::query::{QueryEngine, StreamingResponse};

/// What the session delegates to: building indexes and answering questions.
pub trait Backend {
    fn build_index(&self, source: &SourceDocument, cancel: &CancelToken) -> Result<IndexSummary>;

    fn query(&self, question: &str, document: &str) -> Result<StreamingResponse>;
}

/// PDF indexer and OpenAI-backed query engine sharing one embedder.
pub struct Assistant {
    indexer: Indexer,
    engine: QueryEngine,
}

impl Assistant {
    pub fn new(indexer: Indexer, engine: QueryEngine) -> Self {
        Self { indexer, engine }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = OpenAiClient::new(&config.openai)?;

        let embedder: Arc<dyn Embedder> = match config.embeddings {
            EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbedder::new(
                client.clone(),
                &config.openai.embedding_model,
            )),
            EmbeddingBackend::Local => Arc::new(HarmonicEmbedder::new()),
        };
        tracing::debug!(model = %embedder.model_id(), "embedding backend");

        let indexer = Indexer::new(
            Box::new(PdfLoader),
            embedder.clone(),
            Chunker::new(config.chunk_size, config.chunk_overlap),
            &config.paths.indexes,
        );

        let chat = OpenAiChat::new(
            client,
            &config.openai.chat_model,
            config.openai.temperature,
        );
        let engine = QueryEngine::new(&config.paths.indexes, embedder, Box::new(chat), config.top_k);

        Ok(Self::new(indexer, engine))
    }
}

impl Backend for Assistant {
    fn build_index(&self, source: &SourceDocument, cancel: &CancelToken) -> Result<IndexSummary> {
        self.indexer.build_index(source, cancel)
    }

    fn query(&self, question: &str, document: &str) -> Result<StreamingResponse> {
        self.engine.query(question, document)
    }
}
