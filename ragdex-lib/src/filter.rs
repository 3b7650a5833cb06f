//! Similarity-cutoff filtering of retrieval results

use crate::fragment::ScoredFragment;

/// Drop fragments scoring below `cutoff`.
///
/// `None` means no filtering and returns the input unchanged. Survivors keep
/// their relative order; the result is always a subsequence of the input.
#[must_use]
pub fn apply_cutoff(fragments: Vec<ScoredFragment>, cutoff: Option<f32>) -> Vec<ScoredFragment> {
    match cutoff {
        None => fragments,
        Some(c) => fragments.into_iter().filter(|f| f.score >= c).collect(),
    }
}
