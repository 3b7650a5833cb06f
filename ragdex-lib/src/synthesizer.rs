//! Answer synthesis over filtered fragments
//!
//! Runs the selected strategy's combination algorithm against a language
//! model. Synthesis is synchronous and stateless across queries: sequential
//! strategies thread their running answer through the calls explicitly, and
//! a cancelled query yields an error, never a half-refined answer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::fragment::ScoredFragment;
use crate::llm::LanguageModel;
use crate::prompt::PromptTemplate;
use crate::strategy::Strategy;
use crate::{Error, Result};

/// Cooperative cancellation for in-flight multi-step synthesis.
///
/// Checked before every backend call, so a caller-level timeout can abort a
/// refine chain between steps. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A synthesized answer plus the fragments consumed to produce it.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Final answer text; empty for `no_text` and for empty retrievals
    pub text: String,
    /// Consumed fragments, in consumption order
    pub fragments: Vec<ScoredFragment>,
}

/// Runs a [`Strategy`] over fragments and a language model.
pub struct Synthesizer {
    /// Char budget for one model call's packed context
    pub max_context_chars: usize,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self { max_context_chars: 12_000 }
    }
}

impl Synthesizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_context_budget(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }

    /// Synthesize an answer from already-filtered fragments.
    ///
    /// `no_text` ignores `llm` entirely; every other mode requires one. An
    /// empty fragment list is valid for all modes and produces an empty
    /// answer without any backend call. Backend failures propagate
    /// unmodified; there is no internal retry.
    pub fn synthesize(
        &self,
        query: &str,
        fragments: Vec<ScoredFragment>,
        strategy: &Strategy,
        llm: Option<&dyn LanguageModel>,
        cancel: &CancelToken,
    ) -> Result<Answer> {
        if matches!(strategy, Strategy::NoText) || fragments.is_empty() {
            return Ok(Answer { text: String::new(), fragments });
        }

        let llm = llm.ok_or_else(|| {
            Error::Backend(format!(
                "response mode '{}' requires a language model",
                strategy.mode()
            ))
        })?;

        let texts: Vec<&str> = fragments.iter().map(|f| f.fragment.text.as_str()).collect();
        tracing::debug!(
            mode = strategy.mode(),
            fragments = texts.len(),
            "synthesizing answer"
        );

        let text = match strategy {
            Strategy::NoText => unreachable!(),
            Strategy::Refine { initial, refine } => {
                self.run_refine(query, &texts, initial, refine, llm, cancel)?
            }
            Strategy::Compact { answer, refine }
            | Strategy::SimpleSummarize { answer, refine } => {
                self.run_compact(query, &texts, answer, refine, llm, cancel)?
            }
            Strategy::TreeSummarize { summary } => {
                self.run_tree(query, &texts, summary, llm, cancel)?
            }
            Strategy::Accumulate { answer } => {
                self.run_accumulate(query, &texts, answer, llm, cancel)?
            }
        };

        Ok(Answer { text, fragments })
    }

    /// Initial answer from the first fragment, one refine step per remaining
    /// fragment. Order-sensitive by design.
    fn run_refine(
        &self,
        query: &str,
        texts: &[&str],
        initial: &PromptTemplate,
        refine: &PromptTemplate,
        llm: &dyn LanguageModel,
        cancel: &CancelToken,
    ) -> Result<String> {
        let mut running = call(llm, cancel, &initial.render(texts[0], query))?;
        for text in &texts[1..] {
            running = call(llm, cancel, &refine.render_refine(&running, text, query))?;
        }
        Ok(running)
    }

    /// One call when everything fits in the context budget, otherwise
    /// sequential refinement over packed batches.
    fn run_compact(
        &self,
        query: &str,
        texts: &[&str],
        answer: &PromptTemplate,
        refine: &PromptTemplate,
        llm: &dyn LanguageModel,
        cancel: &CancelToken,
    ) -> Result<String> {
        let batches = pack(texts, self.max_context_chars);
        // All-empty fragment texts pack to nothing; degrade like an empty retrieval
        let Some(first) = batches.first() else {
            return Ok(String::new());
        };

        let mut running = call(llm, cancel, &answer.render(first, query))?;
        for batch in &batches[1..] {
            running = call(llm, cancel, &refine.render_refine(&running, batch, query))?;
        }
        Ok(running)
    }

    /// Summarize context-sized batches, then recurse over the partial
    /// summaries until a single answer remains.
    fn run_tree(
        &self,
        query: &str,
        texts: &[&str],
        summary: &PromptTemplate,
        llm: &dyn LanguageModel,
        cancel: &CancelToken,
    ) -> Result<String> {
        let mut level: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();

        loop {
            let refs: Vec<&str> = level.iter().map(String::as_str).collect();
            let batches = pack(&refs, self.max_context_chars);

            if batches.is_empty() {
                return Ok(String::new());
            }
            if batches.len() == 1 {
                return call(llm, cancel, &summary.render(&batches[0], query));
            }

            level = batches
                .iter()
                .map(|batch| call(llm, cancel, &summary.render(batch, query)))
                .collect::<Result<_>>()?;
        }
    }

    /// One independent call per fragment; per-fragment answers joined in the
    /// original fragment order. The per-call inputs share no state, so this
    /// is the one strategy a caller could parallelize.
    fn run_accumulate(
        &self,
        query: &str,
        texts: &[&str],
        answer: &PromptTemplate,
        llm: &dyn LanguageModel,
        cancel: &CancelToken,
    ) -> Result<String> {
        let answers: Vec<String> = texts
            .iter()
            .map(|text| call(llm, cancel, &answer.render(text, query)))
            .collect::<Result<_>>()?;
        Ok(answers.join("\n\n---\n\n"))
    }
}

fn call(llm: &dyn LanguageModel, cancel: &CancelToken, prompt: &str) -> Result<String> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    llm.complete(prompt)
}

/// Greedily join texts into batches of at most `budget` chars.
///
/// A single text longer than the budget forms its own batch rather than being
/// split. Empty texts contribute nothing, so all-empty input yields no
/// batches.
fn pack(texts: &[&str], budget: usize) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();

    for text in texts {
        if current.is_empty() {
            current.push_str(text);
        } else if current.len() + 2 + text.len() <= budget {
            current.push_str("\n\n");
            current.push_str(text);
        } else {
            batches.push(std::mem::take(&mut current));
            current.push_str(text);
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }

    batches
}
