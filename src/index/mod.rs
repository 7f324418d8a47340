//! Document indexing
//!
//! PDF text → word-window chunks → embeddings → SQLite store under
//! `<index root>/<document name>/`.

pub mod builder;
pub mod chunker;
pub mod embedding;
pub mod loader;
pub mod vectordb;

pub use builder::{IndexSummary, Indexer};
pub use chunker::Chunker;
pub use embedding::{Embedder, HarmonicEmbedder};
pub use loader::{DocumentLoader, PdfLoader, TextLoader};
pub use vectordb::{ScoredChunk, VectorStore};
