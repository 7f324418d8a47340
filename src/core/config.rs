//! Runtime configuration, read from the process environment.
//!
//! `main` loads a local `.env` file first, so every key below can live there.

use std::str::FromStr;
use std::time::Duration;

use super::error::{DocuchatError, Result};
use super::paths::{AppPaths, DEFAULT_INDEXES_DIR, DEFAULT_PDFS_DIR};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_TOP_K: usize = 2;
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_CHUNK_OVERLAP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    OpenAi,
    Local,
}

impl FromStr for EmbeddingBackend {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "local" => Ok(Self::Local),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub paths: AppPaths,
    pub openai: OpenAiConfig,
    pub embeddings: EmbeddingBackend,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai = OpenAiConfig {
            api_key: get("OPENAI_API_KEY"),
            api_base: get("OPENAI_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            chat_model: get("DOCUCHAT_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: get("DOCUCHAT_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            temperature: parse_or("DOCUCHAT_TEMPERATURE", get("DOCUCHAT_TEMPERATURE"), 0.0)?,
            request_timeout: get("DOCUCHAT_REQUEST_TIMEOUT_SECS")
                .map(|v| parse_value::<u64>("DOCUCHAT_REQUEST_TIMEOUT_SECS", &v))
                .transpose()?
                .map(Duration::from_secs),
        };

        let embeddings = match get("DOCUCHAT_EMBEDDINGS") {
            Some(v) => v.parse::<EmbeddingBackend>().map_err(|_| DocuchatError::InvalidConfig {
                key: "DOCUCHAT_EMBEDDINGS",
                value: v.clone(),
            })?,
            None => EmbeddingBackend::OpenAi,
        };

        let config = Self {
            paths: AppPaths::new(
                get("DOCUCHAT_PDFS_DIR").unwrap_or_else(|| DEFAULT_PDFS_DIR.to_string()),
                get("DOCUCHAT_INDEXES_DIR").unwrap_or_else(|| DEFAULT_INDEXES_DIR.to_string()),
            ),
            openai,
            embeddings,
            top_k: parse_or("DOCUCHAT_TOP_K", get("DOCUCHAT_TOP_K"), DEFAULT_TOP_K)?,
            chunk_size: parse_or("DOCUCHAT_CHUNK_SIZE", get("DOCUCHAT_CHUNK_SIZE"), DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parse_or(
                "DOCUCHAT_CHUNK_OVERLAP",
                get("DOCUCHAT_CHUNK_OVERLAP"),
                DEFAULT_CHUNK_OVERLAP,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(DocuchatError::InvalidConfig {
                key: "DOCUCHAT_TOP_K",
                value: self.top_k.to_string(),
            });
        }
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(DocuchatError::InvalidConfig {
                key: "DOCUCHAT_CHUNK_OVERLAP",
                value: format!("{} (chunk size {})", self.chunk_overlap, self.chunk_size),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: AppPaths::default(),
            openai: OpenAiConfig {
                api_key: None,
                api_base: DEFAULT_API_BASE.to_string(),
                chat_model: DEFAULT_CHAT_MODEL.to_string(),
                embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
                temperature: 0.0,
                request_timeout: None,
            },
            embeddings: EmbeddingBackend::OpenAi,
            top_k: DEFAULT_TOP_K,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| DocuchatError::InvalidConfig {
        key,
        value: value.to_string(),
    })
}

fn parse_or<T: FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}
