//! Vector storage backends
//!
//! A store holds fragments with their embeddings and answers nearest-neighbor
//! retrieval over them. Metadata filters are opaque to the pipeline; the
//! store applies them before scoring, so `top_k` bounds the filtered result.

use serde::{Deserialize, Serialize};

use crate::embed::Embedding;
use crate::fragment::{Fragment, ScoredFragment};
use crate::Result;

/// One exact-match condition against fragment metadata.
///
/// `file_name` and `file_path` match the built-in fields; any other key
/// matches the fragment's extra metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter {
    pub key: String,
    pub value: String,
}

impl MetadataFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    /// Whether `fragment` satisfies this condition.
    #[must_use]
    pub fn matches(&self, fragment: &Fragment) -> bool {
        match self.key.as_str() {
            "file_name" => fragment.file_name.as_deref() == Some(self.value.as_str()),
            "file_path" => fragment.file_path.as_deref() == Some(self.value.as_str()),
            key => fragment.extra.get(key).map(String::as_str) == Some(self.value.as_str()),
        }
    }
}

/// Conjunction of metadata conditions; a fragment must satisfy all of them.
pub type MetadataFilters = Vec<MetadataFilter>;

/// Trait for vector storage backends
pub trait VectorStore: Send + Sync {
    /// Insert fragments with their embeddings (parallel slices, same length)
    fn insert(&mut self, fragments: &[Fragment], embeddings: &[Embedding]) -> Result<()>;

    /// Retrieve up to `top_k` fragments nearest to `query_embedding`, best
    /// first, considering only fragments matching `filters`
    fn retrieve(
        &self,
        query_embedding: &Embedding,
        top_k: usize,
        filters: Option<&MetadataFilters>,
    ) -> Result<Vec<ScoredFragment>>;

    /// Total number of stored fragments
    fn len(&self) -> usize;

    /// Whether the store holds no fragments
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all stored data
    fn clear(&mut self);
}

mod memory;
mod persist;

pub use memory::*;
pub use persist::*;
