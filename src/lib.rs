//! docuchat library
//!
//! Turn PDF documents into persisted semantic indexes and ask questions
//! answered by a language model grounded in the retrieved text.
//!
//! # Modules
//!
//! - `core`: paths, configuration, error type, interrupt handling
//! - `index`: text extraction, chunking, embeddings, SQLite vector store
//! - `llm`: OpenAI-compatible embeddings and streamed chat completions
//! - `query`: retrieval plus the question-answering prompt
//! - `session`: the interactive menu state machine

pub mod core;
pub mod index;
pub mod llm;
pub mod query;
pub mod session;

// Re-exports for convenience
pub use crate::core::config::Config;
pub use crate::core::document::{AddMode, SourceDocument};
pub use crate::core::error::{DocuchatError, Result};
pub use crate::core::interrupt::CancelToken;
pub use crate::core::paths::AppPaths;
pub use index::{IndexSummary, Indexer};
pub use query::{QueryEngine, StreamingResponse};
pub use session::{Assistant, Session, State};
