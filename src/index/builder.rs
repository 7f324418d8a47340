//! Index builder - load, chunk, embed and persist one document

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::chunker::Chunker;
use super::embedding::Embedder;
use super::loader::DocumentLoader;
use super::vectordb::{
    VectorStore, META_CHUNKS, META_DIMENSIONS, META_DOCUMENT, META_INDEXED_AT, META_MODEL,
    META_SOURCE,
};
use crate::core::document::SourceDocument;
use crate::core::error::{DocuchatError, Result};
use crate::core::interrupt::CancelToken;
use crate::core::paths::STAGING_DIR;

/// Chunks embedded per request / transaction.
pub const EMBED_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub name: String,
    pub index_dir: PathBuf,
    pub chunk_count: usize,
    pub duration_ms: u128,
}

pub struct Indexer {
    loader: Box<dyn DocumentLoader>,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    indexes_root: PathBuf,
}

impl Indexer {
    pub fn new(
        loader: Box<dyn DocumentLoader>,
        embedder: Arc<dyn Embedder>,
        chunker: Chunker,
        indexes_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            loader,
            embedder,
            chunker,
            indexes_root: indexes_root.into(),
        }
    }

    /// Build the index for `source` at `<indexes_root>/<source.name>`.
    ///
    /// The index is written under the staging directory first and swapped
    /// in once complete, so an existing index is replaced only by a finished
    /// one and a failed build leaves nothing behind. Calls into the loader and
    /// the embedder run as blocking sections of `cancel`.
    pub fn build_index(&self, source: &SourceDocument, cancel: &CancelToken) -> Result<IndexSummary> {
        let start = Instant::now();

        if !source.path.is_file() {
            return Err(DocuchatError::DocumentNotFound(source.path.clone()));
        }

        tracing::info!(document = %source.name, path = %source.path.display(), "building index");

        let pages = {
            let _blocking = cancel.blocking();
            self.loader.load(&source.path)?
        };
        let chunks = self.chunker.split_pages(&pages);
        if chunks.is_empty() {
            tracing::warn!(document = %source.name, "no text extracted; index will be empty");
        }

        fs::create_dir_all(&self.indexes_root)?;
        let staging = StagingDir::create(&self.indexes_root, &source.name)?;

        let mut dimensions = 0;
        {
            let mut store = VectorStore::create(staging.path())?;

            for (batch_no, batch) in chunks.chunks(EMBED_BATCH_SIZE).enumerate() {
                cancel.check()?;

                let texts: Vec<&str> = batch.iter().map(String::as_str).collect();
                let embeddings = {
                    let _blocking = cancel.blocking();
                    self.embedder.embed_batch(&texts)?
                };
                if let Some(first) = embeddings.first() {
                    dimensions = first.len();
                }

                let rows: Vec<(&str, Vec<f32>)> = texts.into_iter().zip(embeddings).collect();
                store.insert_chunks(batch_no * EMBED_BATCH_SIZE, &rows)?;
            }

            store.set_meta(META_DOCUMENT, &source.name)?;
            store.set_meta(META_SOURCE, &source.path.to_string_lossy())?;
            store.set_meta(META_MODEL, &self.embedder.model_id())?;
            store.set_meta(META_DIMENSIONS, &dimensions.to_string())?;
            store.set_meta(META_CHUNKS, &chunks.len().to_string())?;
            store.set_meta(META_INDEXED_AT, &chrono::Utc::now().to_rfc3339())?;
        }

        cancel.check()?;
        let index_dir = self.indexes_root.join(&source.name);
        staging.commit(&index_dir)?;

        let summary = IndexSummary {
            name: source.name.clone(),
            index_dir,
            chunk_count: chunks.len(),
            duration_ms: start.elapsed().as_millis(),
        };
        tracing::info!(
            document = %summary.name,
            chunks = summary.chunk_count,
            duration_ms = summary.duration_ms as u64,
            "index saved"
        );

        Ok(summary)
    }
}

/// Build directory under `<indexes_root>/.docuchat-staging`, removed on drop
/// unless committed.
struct StagingDir {
    root: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl StagingDir {
    fn create(indexes_root: &Path, name: &str) -> Result<Self> {
        let root = indexes_root.join(STAGING_DIR);
        // Leftovers from a run that exited mid-build.
        if root.exists() {
            fs::remove_dir_all(&root)?;
        }
        let path = root.join(name);
        fs::create_dir_all(&path)?;
        Ok(Self {
            root,
            path,
            committed: false,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn commit(mut self, target: &Path) -> Result<()> {
        if target.exists() {
            fs::remove_dir_all(target)?;
        }
        fs::rename(&self.path, target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                tracing::warn!("failed to remove {}: {}", self.path.display(), e);
            }
        }
        // Only succeeds once empty.
        let _ = fs::remove_dir(&self.root);
    }
}
