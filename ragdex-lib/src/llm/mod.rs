//! Language-model backends
//!
//! The query pipeline sees only the [`LanguageModel`] trait; which concrete
//! provider backs it (direct OpenAI, Azure OpenAI, a test double) is decided
//! by whoever constructs the engine. Backend failures surface unmodified so
//! the caller owns the retry policy; retrying a multi-step strategy inside
//! the pipeline would duplicate billable calls.

use crate::Result;

/// Trait for answer-generation model backends
pub trait LanguageModel: Send + Sync {
    /// Complete a single prompt into answer text
    ///
    /// # Errors
    /// [`crate::Error::Backend`] on authentication, network or quota failure.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

/// Placeholder model for engines that only ever run `no_text` queries.
pub struct NoModel;

impl LanguageModel for NoModel {
    fn complete(&self, _prompt: &str) -> Result<String> {
        unreachable!()
    }

    fn model_name(&self) -> &str {
        unreachable!()
    }
}

pub(crate) fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| crate::Error::Backend(format!("{name} is not set")))
}

mod openai;

pub use openai::*;
