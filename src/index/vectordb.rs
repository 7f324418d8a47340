//! Per-document vector store backed by SQLite
//!
//! Chunk text and embeddings live in one database file inside the index
//! directory. Similarity is computed in Rust over all rows, which is plenty
//! for the few thousand chunks a single PDF produces.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::embedding::cosine_similarity;
use crate::core::error::{DocuchatError, Result};

/// File name of the store inside an index directory.
pub const STORE_FILE: &str = "vector_store.db";

pub const META_DOCUMENT: &str = "document_name";
pub const META_SOURCE: &str = "source_path";
pub const META_MODEL: &str = "embedding_model";
pub const META_DIMENSIONS: &str = "dimensions";
pub const META_CHUNKS: &str = "chunk_count";
pub const META_INDEXED_AT: &str = "indexed_at";

pub struct VectorStore {
    conn: Connection,
}

/// A chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub ordinal: usize,
    pub text: String,
    pub score: f32,
}

impl VectorStore {
    /// Create a fresh store inside `dir`.
    pub fn create(dir: &Path) -> Result<Self> {
        let conn = Connection::open(dir.join(STORE_FILE))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a persisted store without write access.
    pub fn open_read_only(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(STORE_FILE);
        if !path.is_file() {
            return Err(DocuchatError::IndexNotFound(name.to_string()));
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY,
                text TEXT NOT NULL
            );

            -- f32 little-endian
            CREATE TABLE IF NOT EXISTS embeddings (
                chunk_id INTEGER PRIMARY KEY,
                embedding BLOB NOT NULL,
                FOREIGN KEY (chunk_id) REFERENCES chunks(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );
            "#,
        )?;

        Ok(())
    }

    /// Append chunks with their embeddings in one transaction.
    ///
    /// `first_ordinal` is the position of the first chunk in the document.
    pub fn insert_chunks(&mut self, first_ordinal: usize, chunks: &[(&str, Vec<f32>)]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut insert_chunk = tx.prepare("INSERT INTO chunks (id, text) VALUES (?1, ?2)")?;
            let mut insert_embedding =
                tx.prepare("INSERT INTO embeddings (chunk_id, embedding) VALUES (?1, ?2)")?;

            for (offset, (text, embedding)) in chunks.iter().enumerate() {
                let id = (first_ordinal + offset) as i64;
                insert_chunk.execute(params![id, text])?;
                insert_embedding.execute(params![id, embedding_to_blob(embedding)])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Top `limit` chunks by cosine similarity, best first.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.id, c.text, e.embedding
            FROM chunks c
            JOIN embeddings e ON c.id = e.chunk_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let text: String = row.get(1)?;
            let blob: Vec<u8> = row.get(2)?;
            Ok((id, text, blob))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (id, text, blob) = row?;
            let score = cosine_similarity(query_embedding, &blob_to_embedding(&blob));
            results.push(ScoredChunk {
                ordinal: id as usize,
                text,
                score,
            });
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.ordinal.cmp(&b.ordinal))
        });
        results.truncate(limit);

        Ok(results)
    }

    pub fn chunk_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO index_meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
