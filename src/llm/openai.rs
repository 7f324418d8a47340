//! Blocking client for an OpenAI-compatible API (embeddings + streamed chat)

use std::io::BufReader;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use super::sse::ChatEventStream;
use super::{ChatModel, TokenStream};
use crate::core::config::OpenAiConfig;
use crate::core::error::{DocuchatError, Result};
use crate::index::embedding::Embedder;

// --- wire types ---

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Shared HTTP plumbing. Cloning shares the connection pool.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_base: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        // Blocking clients default to a 30s timeout; `None` means wait forever.
        let http = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(DocuchatError::MissingConfig("OPENAI_API_KEY"))?;

        let url = format!("{}/{}", self.api_base, path);
        tracing::debug!(%url, "POST");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DocuchatError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> String {
        format!("openai:{}", self.model)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text])?;
        batch.pop().ok_or_else(|| DocuchatError::Api {
            status: 200,
            body: "embedding response contained no data".to_string(),
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let response: EmbeddingResponse = self.client.post("embeddings", &request)?.json()?;
        order_embeddings(response.data, texts.len())
    }
}

/// Put embeddings back in request order and check none are missing.
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(DocuchatError::Api {
            status: 200,
            body: format!("expected {} embeddings, got {}", expected, data.len()),
        });
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

pub struct OpenAiChat {
    client: OpenAiClient,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(client: OpenAiClient, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            stream: true,
        }
    }
}

impl ChatModel for OpenAiChat {
    fn stream_chat(&self, prompt: &str) -> Result<TokenStream> {
        let response = self.client.post("chat/completions", &self.request(prompt))?;
        Ok(Box::new(ChatEventStream::new(BufReader::new(response))))
    }
}
