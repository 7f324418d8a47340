//! Retrieval-augmented question answering over a persisted index

pub mod engine;
pub mod prompt;

pub use engine::{QueryEngine, StreamingResponse};
pub use prompt::{render_qa_prompt, QA_PROMPT_TEMPLATE};
