//! Prompt templates for the QA pipeline, loaded from a JSON file at startup.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors loading the prompt file. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt file not found or unreadable at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("prompt file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The seven named templates the pipeline renders.
///
/// Templates use `{name}` placeholders; see [`render`] for substitution.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptSet {
    /// Produces newline-separated alternate phrasings of the user query.
    pub query_generation: String,
    /// Synthesizes the analysis note from query + retrieved fragments.
    pub validation_plan: String,
    /// Reserved for answer-selection experiments; loaded but not wired into
    /// the current pipeline.
    pub validation_choice: String,
    /// Judges whether the analysis note contains a satisfactory answer.
    pub validation_voting: String,
    /// Final answer generation, used when voting gates the run.
    pub answer_generation: String,
    /// Maps the raw query to an integer intent code.
    pub classification: String,
    /// Final answer generation, used when voting is disabled.
    pub answer_generation_with_voting: String,
}

impl PromptSet {
    /// Load the template set from a JSON file.
    ///
    /// Accepts either a flat object of templates or one nested under a
    /// top-level `"prompts"` key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PromptError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut value: serde_json::Value = serde_json::from_str(&raw)?;
        if let Some(inner) = value.get_mut("prompts").filter(|v| v.is_object()) {
            value = inner.take();
        }

        Ok(serde_json::from_value(value)?)
    }
}

/// Substitute `{name}` placeholders in a template.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_json(wrapped: bool) -> String {
        let inner = r#"{
            "query_generation": "Rephrase: {query}",
            "validation_plan": "Analyze {query} with {best_fragments_str}",
            "validation_choice": "Choose",
            "validation_voting": "Vote on {analysis_note}",
            "answer_generation": "Answer {query}",
            "classification": "Classify {query}",
            "answer_generation_with_voting": "Answer without gate {query}"
        }"#;
        if wrapped {
            format!(r#"{{"prompts": {inner}}}"#)
        } else {
            inner.to_string()
        }
    }

    #[test]
    fn render_substitutes_all_placeholders() {
        let out = render(
            "Q: {query} Docs: {best_fragments_str}",
            &[("query", "how?"), ("best_fragments_str", "stuff")],
        );
        assert_eq!(out, "Q: how? Docs: stuff");
    }

    #[test]
    fn render_leaves_unknown_placeholders_untouched() {
        let out = render("{query} and {other}", &[("query", "x")]);
        assert_eq!(out, "x and {other}");
    }

    #[test]
    fn loads_flat_prompt_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(sample_json(false).as_bytes()).unwrap();

        let prompts = PromptSet::from_file(f.path()).unwrap();
        assert_eq!(prompts.classification, "Classify {query}");
    }

    #[test]
    fn loads_wrapped_prompt_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(sample_json(true).as_bytes()).unwrap();

        let prompts = PromptSet::from_file(f.path()).unwrap();
        assert_eq!(prompts.query_generation, "Rephrase: {query}");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = PromptSet::from_file("does/not/exist.json").unwrap_err();
        assert!(matches!(err, PromptError::Io { .. }));
    }

    #[test]
    fn missing_template_key_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"{"classification": "only one"}"#).unwrap();
        assert!(PromptSet::from_file(f.path()).is_err());
    }
}
