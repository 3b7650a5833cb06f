//! High-level query pipeline
//!
//! Combines embedder, store, language model and synthesizer into one query
//! API: embed the question, retrieve candidates, drop those under the
//! similarity cutoff, run the selected response mode, and attribute the
//! answer back to its source documents. Single-threaded and synchronous per
//! query; any stage failure aborts the query and reaches the caller as-is.
//!
//! # Usage
//!
//! ```ignore
//! use ragdex_lib::query::{QueryEngine, QueryOptions};
//!
//! let mut engine = QueryEngine::with_model(embedder, store, llm);
//! let response = engine.query(
//!     "What is Artificial Intelligence?",
//!     "compact",
//!     &QueryOptions { similarity_cutoff: Some(0.40), top_k: 5, ..Default::default() },
//! )?;
//! println!("{}", response.answer);
//! for source in &response.sources {
//!     println!("- {}: {} fragment(s)", source.file_name, source.fragment_count);
//! }
//! ```

use crate::embed::Embedder;
use crate::filter::apply_cutoff;
use crate::fragment::ScoredFragment;
use crate::llm::{LanguageModel, NoModel};
use crate::provenance::{aggregate, SourceSummary};
use crate::store::{MetadataFilters, VectorStore};
use crate::strategy::Strategy;
use crate::synthesizer::{CancelToken, Synthesizer};
use crate::Result;

/// Knobs for one query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Minimum similarity a fragment must meet to be used in synthesis;
    /// `None` disables filtering
    pub similarity_cutoff: Option<f32>,
    /// Upper bound on retrieved fragments
    pub top_k: usize,
    /// Opaque exact-match conditions passed through to the store
    pub filters: Option<MetadataFilters>,
    /// Checked before every backend call
    pub cancel: CancelToken,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            similarity_cutoff: None,
            top_k: 5,
            filters: None,
            cancel: CancelToken::new(),
        }
    }
}

/// What a query returns: the answer and where it came from.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    /// Synthesized answer text; empty for `no_text` and for empty retrievals
    pub answer: String,
    /// Per-document provenance, in first-occurrence order
    pub sources: Vec<SourceSummary>,
    /// The fragments consumed by synthesis, in consumption order
    pub fragments: Vec<ScoredFragment>,
}

/// Query pipeline over an embedder, a vector store and a language model.
pub struct QueryEngine<E: Embedder, S: VectorStore, L: LanguageModel = NoModel> {
    embedder: E,
    store: S,
    llm: Option<L>,
    synthesizer: Synthesizer,
}

// Constructor for retrieval-only engines (`no_text` queries)
impl<E: Embedder, S: VectorStore> QueryEngine<E, S, NoModel> {
    /// Engine without a language model; only `no_text` queries will succeed.
    #[must_use]
    pub fn new(embedder: E, store: S) -> Self {
        Self {
            embedder,
            store,
            llm: None,
            synthesizer: Synthesizer::new(),
        }
    }
}

impl<E: Embedder, S: VectorStore, L: LanguageModel> QueryEngine<E, S, L> {
    /// Engine with an answer-generation model.
    #[must_use]
    pub fn with_model(embedder: E, store: S, llm: L) -> Self {
        Self {
            embedder,
            store,
            llm: Some(llm),
            synthesizer: Synthesizer::new(),
        }
    }

    /// Replace the synthesizer, e.g. to change the context budget.
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Answer `query_text` under the given response mode.
    ///
    /// Zero fragments after filtering is not an error; the synthesizer
    /// degrades to an empty answer with empty sources.
    pub fn query(
        &mut self,
        query_text: &str,
        response_mode: &str,
        options: &QueryOptions,
    ) -> Result<QueryResponse> {
        let strategy = Strategy::select(response_mode)?;

        let query_embedding = self.embedder.embed_query(query_text)?;
        let retrieved =
            self.store
                .retrieve(&query_embedding, options.top_k, options.filters.as_ref())?;
        tracing::debug!(retrieved = retrieved.len(), "retrieval complete");

        let fragments = apply_cutoff(retrieved, options.similarity_cutoff);
        tracing::debug!(
            surviving = fragments.len(),
            cutoff = ?options.similarity_cutoff,
            "cutoff filter applied"
        );

        let llm = if strategy.needs_model() {
            self.llm.as_ref().map(|l| l as &dyn LanguageModel)
        } else {
            None
        };

        let answer =
            self.synthesizer
                .synthesize(query_text, fragments, &strategy, llm, &options.cancel)?;
        let sources = aggregate(&answer);

        Ok(QueryResponse {
            answer: answer.text,
            sources,
            fragments: answer.fragments,
        })
    }

    /// Returns a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::embed::Embedding;
    use crate::fragment::Fragment;
    use crate::{Error, Result};

    struct StubEmbedder;

    impl Embedder for StubEmbedder {
        fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn embed_query(&mut self, _text: &str) -> Result<Embedding> {
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    /// Store returning a canned retrieval result, ignoring the query vector.
    struct StubStore {
        results: Vec<ScoredFragment>,
    }

    impl VectorStore for StubStore {
        fn insert(&mut self, _: &[Fragment], _: &[Embedding]) -> Result<()> {
            Ok(())
        }

        fn retrieve(
            &self,
            _query_embedding: &Embedding,
            top_k: usize,
            _filters: Option<&MetadataFilters>,
        ) -> Result<Vec<ScoredFragment>> {
            Ok(self.results.iter().take(top_k).cloned().collect())
        }

        fn len(&self) -> usize {
            self.results.len()
        }

        fn clear(&mut self) {}
    }

    struct CountingLlm {
        prompts: Mutex<Vec<String>>,
    }

    impl CountingLlm {
        fn new() -> Self {
            Self { prompts: Mutex::new(Vec::new()) }
        }
    }

    impl LanguageModel for CountingLlm {
        fn complete(&self, prompt: &str) -> Result<String> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(format!("generated answer {}", prompts.len()))
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn frag(id: &str, file: &str, text: &str, score: f32) -> ScoredFragment {
        ScoredFragment::new(
            Fragment {
                id: id.to_string(),
                text: text.to_string(),
                start_char: 0,
                end_char: text.len(),
                file_name: Some(file.to_string()),
                file_path: Some(format!("/docs/{file}")),
                extra: Default::default(),
            },
            score,
        )
    }

    #[test]
    fn test_compact_query_with_cutoff() {
        // One document, two fragments scoring 0.62 and 0.35; cutoff 0.40
        // keeps only the first, and provenance counts exactly one fragment.
        let store = StubStore {
            results: vec![
                frag("f1", "ai.md", "AI is the simulation of human intelligence.", 0.62),
                frag("f2", "ai.md", "Completely unrelated trivia.", 0.35),
            ],
        };
        let mut engine = QueryEngine::with_model(StubEmbedder, store, CountingLlm::new());

        let options = QueryOptions {
            similarity_cutoff: Some(0.40),
            top_k: 5,
            ..Default::default()
        };
        let response = engine
            .query("What is Artificial Intelligence?", "compact", &options)
            .unwrap();

        assert_eq!(response.fragments.len(), 1);
        assert_eq!(response.fragments[0].fragment.id, "f1");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].file_name, "ai.md");
        assert_eq!(response.sources[0].fragment_count, 1);
        assert!(!response.answer.is_empty());

        let prompts = engine.llm.as_ref().unwrap().prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("simulation of human intelligence"));
        assert!(!prompts[0].contains("unrelated trivia"));
    }

    #[test]
    fn test_no_text_makes_no_model_calls() {
        let store = StubStore {
            results: vec![
                frag("f1", "a.md", "alpha", 0.9),
                frag("f2", "b.md", "beta", 0.8),
            ],
        };
        let mut engine = QueryEngine::with_model(StubEmbedder, store, CountingLlm::new());

        let response = engine
            .query("anything", "no_text", &QueryOptions::default())
            .unwrap();

        assert!(response.answer.is_empty());
        // Sources still reflect every fragment passed to synthesis
        assert_eq!(response.sources.len(), 2);
        assert_eq!(engine.llm.as_ref().unwrap().prompts.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_no_text_works_without_model() {
        let store = StubStore { results: vec![frag("f1", "a.md", "alpha", 0.9)] };
        let mut engine = QueryEngine::new(StubEmbedder, store);

        let response = engine
            .query("anything", "no_text", &QueryOptions::default())
            .unwrap();
        assert_eq!(response.sources.len(), 1);
    }

    #[test]
    fn test_accumulate_one_call_per_fragment() {
        let store = StubStore {
            results: vec![
                frag("f1", "a.md", "alpha", 0.9),
                frag("f2", "b.md", "beta", 0.8),
                frag("f3", "a.md", "gamma", 0.7),
            ],
        };
        let mut engine = QueryEngine::with_model(StubEmbedder, store, CountingLlm::new());

        let response = engine
            .query("q", "accumulate", &QueryOptions::default())
            .unwrap();

        assert_eq!(engine.llm.as_ref().unwrap().prompts.lock().unwrap().len(), 3);
        // Consumed order matches retrieval order
        let ids: Vec<&str> = response.fragments.iter().map(|f| f.fragment.id.as_str()).collect();
        assert_eq!(ids, vec!["f1", "f2", "f3"]);
        // Two documents, first-seen order
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0].file_name, "a.md");
        assert_eq!(response.sources[0].fragment_count, 2);
    }

    #[test]
    fn test_unknown_mode_fails_before_any_backend_work() {
        let store = StubStore { results: vec![frag("f1", "a.md", "alpha", 0.9)] };
        let mut engine = QueryEngine::with_model(StubEmbedder, store, CountingLlm::new());

        let err = engine
            .query("q", "definitely_not_a_mode", &QueryOptions::default())
            .unwrap_err();

        match err {
            Error::InvalidStrategy(mode) => assert_eq!(mode, "definitely_not_a_mode"),
            other => panic!("expected InvalidStrategy, got {other:?}"),
        }
        assert_eq!(engine.llm.as_ref().unwrap().prompts.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_everything_filtered_out_is_not_an_error() {
        let store = StubStore { results: vec![frag("f1", "a.md", "alpha", 0.1)] };
        let mut engine = QueryEngine::with_model(StubEmbedder, store, CountingLlm::new());

        let options = QueryOptions { similarity_cutoff: Some(0.9), ..Default::default() };
        let response = engine.query("q", "accumulate", &options).unwrap();

        assert!(response.answer.is_empty());
        assert!(response.sources.is_empty());
        assert_eq!(engine.llm.as_ref().unwrap().prompts.lock().unwrap().len(), 0);
    }

    #[test]
    fn test_top_k_bounds_retrieval() {
        let store = StubStore {
            results: (0..10)
                .map(|i| frag(&format!("f{i}"), "a.md", "text", 0.9 - i as f32 * 0.01))
                .collect(),
        };
        let mut engine = QueryEngine::with_model(StubEmbedder, store, CountingLlm::new());

        let options = QueryOptions { top_k: 3, ..Default::default() };
        let response = engine.query("q", "no_text", &options).unwrap();
        assert_eq!(response.fragments.len(), 3);
    }
}
