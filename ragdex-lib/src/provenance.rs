//! Provenance aggregation
//!
//! Maps an answer back to the source documents that produced it: fragment
//! counts per document, in first-occurrence order among the consumed
//! fragments. Deliberately not sorted by count, so the ordering mirrors how
//! the retrieval ranked the documents.

use std::collections::HashMap;

use serde::Serialize;

use crate::synthesizer::Answer;

/// Sentinel recorded when a document has no known path.
pub const UNKNOWN_PATH: &str = "unknown path";

/// Per-document aggregate of an answer's consumed fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub file_name: String,
    pub file_path: String,
    pub fragment_count: usize,
}

/// Summarize which documents contributed to `answer`.
///
/// Fragments without a file name contributed to synthesis but cannot be
/// attributed, so they are silently excluded. The first-seen path wins for a
/// document; a missing path becomes [`UNKNOWN_PATH`].
#[must_use]
pub fn aggregate(answer: &Answer) -> Vec<SourceSummary> {
    let mut summaries: Vec<SourceSummary> = Vec::new();
    let mut by_name: HashMap<&str, usize> = HashMap::new();

    for scored in &answer.fragments {
        let Some(name) = scored.fragment.file_name.as_deref() else {
            continue;
        };

        match by_name.get(name) {
            Some(&i) => summaries[i].fragment_count += 1,
            None => {
                by_name.insert(name, summaries.len());
                summaries.push(SourceSummary {
                    file_name: name.to_string(),
                    file_path: scored
                        .fragment
                        .file_path
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_PATH.to_string()),
                    fragment_count: 1,
                });
            }
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{Fragment, ScoredFragment};

    fn frag(name: Option<&str>, path: Option<&str>) -> ScoredFragment {
        ScoredFragment::new(
            Fragment {
                id: "f".to_string(),
                text: "text".to_string(),
                start_char: 0,
                end_char: 4,
                file_name: name.map(str::to_string),
                file_path: path.map(str::to_string),
                extra: Default::default(),
            },
            0.5,
        )
    }

    fn answer(fragments: Vec<ScoredFragment>) -> Answer {
        Answer { text: "answer".to_string(), fragments }
    }

    #[test]
    fn test_first_seen_order_not_count_order() {
        // Consumption order A, A, B, A: A first despite interleaving, and
        // never re-sorted by count.
        let a = answer(vec![
            frag(Some("a.md"), Some("/docs/a.md")),
            frag(Some("a.md"), Some("/docs/a.md")),
            frag(Some("b.md"), Some("/docs/b.md")),
            frag(Some("a.md"), Some("/docs/a.md")),
        ]);

        let summaries = aggregate(&a);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].file_name, "a.md");
        assert_eq!(summaries[0].fragment_count, 3);
        assert_eq!(summaries[1].file_name, "b.md");
        assert_eq!(summaries[1].fragment_count, 1);
    }

    #[test]
    fn test_missing_path_uses_sentinel() {
        let summaries = aggregate(&answer(vec![frag(Some("a.md"), None)]));
        assert_eq!(summaries[0].file_path, UNKNOWN_PATH);
    }

    #[test]
    fn test_first_seen_path_wins() {
        let summaries = aggregate(&answer(vec![
            frag(Some("a.md"), Some("/first/a.md")),
            frag(Some("a.md"), Some("/second/a.md")),
        ]));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].file_path, "/first/a.md");
    }

    #[test]
    fn test_unattributable_fragments_are_skipped() {
        let summaries = aggregate(&answer(vec![
            frag(None, Some("/docs/ghost.md")),
            frag(Some("a.md"), None),
        ]));

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].file_name, "a.md");
    }

    #[test]
    fn test_empty_answer() {
        assert!(aggregate(&answer(vec![])).is_empty());
    }

    #[test]
    fn test_summaries_reference_only_consumed_documents() {
        let a = answer(vec![frag(Some("a.md"), None), frag(Some("b.md"), None)]);
        let names: Vec<String> = aggregate(&a).into_iter().map(|s| s.file_name).collect();
        for name in &names {
            assert!(a
                .fragments
                .iter()
                .any(|f| f.fragment.file_name.as_deref() == Some(name)));
        }
    }
}
