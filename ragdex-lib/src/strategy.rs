//! Response-mode selection
//!
//! Maps a requested response mode string onto a synthesis strategy: a
//! combination algorithm plus the prompt template(s) it runs with. Selection
//! is a pure function of the mode string; an unrecognized mode is an error,
//! never a silent default.
//!
//! Every prompt carries two standing instructions from the source corpus:
//! ask for more specific context when the question is unrelated, and when
//! the context refers to an image or diagram, say the precise answer requires
//! inspecting that artifact instead of inventing its content.

use crate::error::{Error, Result};
use crate::prompt::PromptTemplate;

const ARTIFACT_NOTE: &str = "If the context needed to answer refers to an image or a flow \
diagram, reply that the question relates to that referenced image and that it must be \
inspected directly to obtain a precise answer.\n\n";

const OFF_TOPIC_NOTE: &str = "If the question is unrelated to the context, reply asking for \
more specific context.\n\n";

/// A synthesis strategy: one recognized response mode with its templates.
///
/// Closed enum; adding a mode means adding a variant here and a branch in the
/// synthesizer, there is no fall-through.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// No language-model call at all; structural answer only
    NoText,
    /// Sequential refinement: initial answer, then one refine step per fragment
    Refine {
        initial: PromptTemplate,
        refine: PromptTemplate,
    },
    /// Pack fragments into one call when they fit, refine across batches when not
    Compact {
        answer: PromptTemplate,
        refine: PromptTemplate,
    },
    /// Compact packing with a terse-answer instruction
    SimpleSummarize {
        answer: PromptTemplate,
        refine: PromptTemplate,
    },
    /// Hierarchical reduction of batch summaries down to a single answer
    TreeSummarize { summary: PromptTemplate },
    /// One independent call per fragment, answers collected in order
    Accumulate { answer: PromptTemplate },
}

impl Strategy {
    /// Resolve a response mode string to its strategy.
    ///
    /// # Errors
    /// [`Error::InvalidStrategy`] naming the offending string when the mode
    /// is not one of the six recognized modes.
    pub fn select(mode: &str) -> Result<Strategy> {
        match mode {
            "no_text" => Ok(Strategy::NoText),
            "refine" => Ok(Strategy::Refine {
                initial: PromptTemplate::new(format!(
                    "{ARTIFACT_NOTE}Context:\n{{context}}\n\nQuestion: {{query}}\n\n\
                     Produce a clear and precise initial answer:"
                )),
                refine: PromptTemplate::new(
                    "Previous partial answer:\n{existing_answer}\n\n\
                     New context:\n{context}\n\n\
                     Refine and improve the answer taking the new context into account:",
                ),
            }),
            "compact" => Ok(Strategy::Compact {
                answer: PromptTemplate::new(format!(
                    "Answer the following question using the information given in the \
                     context.\n\n{OFF_TOPIC_NOTE}{ARTIFACT_NOTE}\
                     Context:\n{{context}}\n\nQuestion: {{query}}\n\nAnswer:"
                )),
                refine: compact_refine_template(),
            }),
            "simple_summarize" => Ok(Strategy::SimpleSummarize {
                answer: PromptTemplate::new(format!(
                    "Answer the following question using the information given in the \
                     context.\n\n{OFF_TOPIC_NOTE}{ARTIFACT_NOTE}\
                     Context:\n{{context}}\n\nQuestion: {{query}}\n\nShort answer:"
                )),
                refine: compact_refine_template(),
            }),
            "tree_summarize" => Ok(Strategy::TreeSummarize {
                summary: PromptTemplate::new(format!(
                    "Answer the following question using the information given in the \
                     context.\n\n{OFF_TOPIC_NOTE}{ARTIFACT_NOTE}\
                     Read the following content:\n{{context}}\n\n\
                     Then answer this question:\n{{query}}\n\nSummary:"
                )),
            }),
            "accumulate" => Ok(Strategy::Accumulate {
                answer: PromptTemplate::new(format!(
                    "{ARTIFACT_NOTE}Question: {{query}}\nFragment:\n{{context}}\n\
                     Answer the question based only on this fragment. If it holds no \
                     relevant information, reply 'Insufficient information'."
                )),
            }),
            other => Err(Error::InvalidStrategy(other.to_string())),
        }
    }

    /// The mode string this strategy answers to.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Strategy::NoText => "no_text",
            Strategy::Refine { .. } => "refine",
            Strategy::Compact { .. } => "compact",
            Strategy::SimpleSummarize { .. } => "simple_summarize",
            Strategy::TreeSummarize { .. } => "tree_summarize",
            Strategy::Accumulate { .. } => "accumulate",
        }
    }

    /// Whether this strategy needs a language model at all.
    #[must_use]
    pub fn needs_model(&self) -> bool {
        !matches!(self, Strategy::NoText)
    }
}

// Refine step used when packed compact/simple_summarize content does not fit
// in a single call.
fn compact_refine_template() -> PromptTemplate {
    PromptTemplate::new(format!(
        "Previous answer:\n{{existing_answer}}\n\n\
         Additional context:\n{{context}}\n\n\
         Question: {{query}}\n\n{ARTIFACT_NOTE}\
         Update the answer if the additional context adds anything:"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_recognizes_all_modes() {
        for mode in [
            "no_text",
            "refine",
            "compact",
            "simple_summarize",
            "tree_summarize",
            "accumulate",
        ] {
            let strategy = Strategy::select(mode).unwrap();
            assert_eq!(strategy.mode(), mode);
        }
    }

    #[test]
    fn test_select_rejects_unknown_mode() {
        let err = Strategy::select("tree_refine").unwrap_err();
        match err {
            Error::InvalidStrategy(m) => assert_eq!(m, "tree_refine"),
            other => panic!("expected InvalidStrategy, got {other:?}"),
        }
    }

    #[test]
    fn test_select_rejects_empty_mode() {
        assert!(matches!(
            Strategy::select(""),
            Err(Error::InvalidStrategy(_))
        ));
    }

    #[test]
    fn test_select_is_case_sensitive() {
        // Mode matching is exact; "Compact" is not a recognized mode and must
        // not silently fall back to "compact".
        assert!(matches!(
            Strategy::select("Compact"),
            Err(Error::InvalidStrategy(_))
        ));
    }

    #[test]
    fn test_no_text_needs_no_model() {
        assert!(!Strategy::select("no_text").unwrap().needs_model());
        assert!(Strategy::select("refine").unwrap().needs_model());
    }

    #[test]
    fn test_templates_carry_placeholders() {
        let Strategy::Refine { initial, refine } = Strategy::select("refine").unwrap() else {
            panic!("refine mode must select Refine");
        };
        assert!(initial.text().contains("{context}"));
        assert!(initial.text().contains("{query}"));
        assert!(refine.text().contains("{existing_answer}"));
    }

    #[test]
    fn test_templates_carry_artifact_instruction() {
        for mode in ["refine", "compact", "simple_summarize", "tree_summarize", "accumulate"] {
            let strategy = Strategy::select(mode).unwrap();
            let text = match &strategy {
                Strategy::Refine { initial, .. } => initial.text(),
                Strategy::Compact { answer, .. }
                | Strategy::SimpleSummarize { answer, .. }
                | Strategy::Accumulate { answer } => answer.text(),
                Strategy::TreeSummarize { summary } => summary.text(),
                Strategy::NoText => unreachable!(),
            };
            assert!(text.contains("image"), "{mode} prompt lacks artifact note");
        }
    }

    #[test]
    fn test_accumulate_allows_insufficient_information() {
        let Strategy::Accumulate { answer } = Strategy::select("accumulate").unwrap() else {
            panic!("accumulate mode must select Accumulate");
        };
        assert!(answer.text().contains("Insufficient information"));
    }
}
