//! Text embedding backends
//!
//! Two implementations of the same trait: a local ONNX model via fastembed
//! and a hosted OpenAI/Azure endpoint. Indexing and querying must use the
//! same model configuration or scores stop being comparable.

use crate::Result;

/// A vector embedding
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for indexing
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for retrieval
    ///
    /// Kept separate from document embedding because some models (BGE among
    /// them) prepend a query-specific prompt.
    fn embed_query(&mut self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

mod bge;
mod openai;

pub use bge::*;
pub use openai::*;
