//! Retrieved fragments and their scores
//!
//! A [`Fragment`] is the stored unit: a span of text cut from a source
//! document, plus enough metadata to attribute it back to that document.
//! Retrieval attaches a similarity score, producing a [`ScoredFragment`].
//! Scores are comparable within one retrieval call only, not across index
//! versions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A unit of document text held by the index.
///
/// Immutable once retrieved: the pipeline never rewrites a fragment, it only
/// filters, reorders and attributes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fragment {
    /// Unique identifier for this fragment
    pub id: String,
    /// The fragment text
    pub text: String,
    /// Start char offset into the source document
    pub start_char: usize,
    /// End char offset into the source document (exclusive)
    pub end_char: usize,
    /// Source document name, when known
    pub file_name: Option<String>,
    /// Source document path, when known
    pub file_path: Option<String>,
    /// Arbitrary additional metadata, matchable by retrieval filters
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

/// A fragment with the similarity score attached at retrieval time.
///
/// Higher is more relevant. A retrieval result is a `Vec<ScoredFragment>`
/// ordered by descending score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    pub score: f32,
}

impl ScoredFragment {
    pub fn new(fragment: Fragment, score: f32) -> Self {
        Self { fragment, score }
    }
}

impl PartialOrd for ScoredFragment {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.score.partial_cmp(&other.score)
    }
}
