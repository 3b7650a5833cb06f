use crate::embed::Embedding;
use crate::fragment::{Fragment, ScoredFragment};
use crate::store::{MetadataFilters, VectorStore};
use crate::{Error, Result};

/// In-memory vector store with brute-force cosine similarity.
///
/// Fine for corpus sizes this system targets (thousands of fragments); a
/// dedicated vector database is the swap-in for anything larger.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) records: Vec<(Fragment, Embedding)>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for MemoryStore {
    fn insert(&mut self, fragments: &[Fragment], embeddings: &[Embedding]) -> Result<()> {
        if fragments.len() != embeddings.len() {
            return Err(Error::Retrieval(format!(
                "{} fragments with {} embeddings",
                fragments.len(),
                embeddings.len()
            )));
        }

        for (fragment, embedding) in fragments.iter().zip(embeddings) {
            // Last write wins for a repeated fragment id
            self.records.retain(|(f, _)| f.id != fragment.id);
            self.records.push((fragment.clone(), embedding.clone()));
        }
        Ok(())
    }

    fn retrieve(
        &self,
        query_embedding: &Embedding,
        top_k: usize,
        filters: Option<&MetadataFilters>,
    ) -> Result<Vec<ScoredFragment>> {
        let mut scored: Vec<ScoredFragment> = self
            .records
            .iter()
            .filter(|(fragment, _)| match filters {
                Some(fs) => fs.iter().all(|f| f.matches(fragment)),
                None => true,
            })
            .map(|(fragment, embedding)| {
                ScoredFragment::new(fragment.clone(), cosine_similarity(query_embedding, embedding))
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn clear(&mut self) {
        self.records.clear();
    }
}

/// Cosine similarity in [-1, 1]; zero for a zero-norm operand.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
