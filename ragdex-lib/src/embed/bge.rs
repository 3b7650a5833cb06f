use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// Local embedder using BAAI/bge-small-en-v1.5 over fastembed's ONNX runtime.
///
/// 384-dimensional embeddings, up to 512 tokens per input. The model is
/// downloaded on first use; no credentials involved, which makes this the
/// default for local indexes.
pub struct BgeEmbedder {
    model: TextEmbedding,
}

impl BgeEmbedder {
    pub fn new() -> Result<Self> {
        let opts = InitOptions::new(EmbeddingModel::BGESmallENV15);

        TextEmbedding::try_new(opts)
            .map(|model| Self { model })
            .map_err(|e| Error::Backend(format!("embedding model init failed: {e}")))
    }
}

impl Embedder for BgeEmbedder {
    fn model_name(&self) -> &str {
        "BAAI/bge-small-en-v1.5"
    }

    fn dimension(&self) -> usize {
        384
    }

    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::Backend(e.to_string()))
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        // BGE prepends a retrieval prompt on the query side only
        let query_text = format!("Represent this sentence for searching relevant passages: {text}");

        self.model
            .embed(vec![query_text], None)
            .map_err(|e| Error::Backend(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Backend("model returned no embeddings".to_string()))
    }
}
