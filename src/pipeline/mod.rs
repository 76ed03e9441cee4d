//! The QA pipeline: classification → routing → multi-query retrieval →
//! analysis → optional voting → answer generation.
//!
//! The conditional stage graph is deliberately a plain sequential function
//! with early returns; branches and templates are fixed when the pipeline is
//! constructed, so no composable-chain abstraction is needed.

pub mod expand;
pub mod parse;

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;

use crate::config::Parameters;
use crate::gateway::{ChatGateway, ProviderError, StageLlm};
use crate::prompts::{render, PromptSet};
use crate::retriever::{ApiRetriever, Document};
use crate::trace::{StepEvent, TraceHandler};

// =============================================================================
// APPLICATION POLICY
// =============================================================================

/// Canned reply for intent code 1 (greeting).
pub const GREETING_REPLY: &str = "Welcome to our site! How can we help you?";

/// Canned reply for intent code 2 (closing).
pub const CLOSING_REPLY: &str = "Glad we could help you.";

/// Reply for intent codes outside the known set.
pub const CLARIFY_REPLY: &str =
    "We could not determine the type of your request. Please rephrase it.";

/// Sentinel answer when voting rejects the analysis note.
pub const NO_ANSWER: &str = "NO ANSWER";

// Per-stage sampling temperatures.
const TEMP_CLASSIFIER: f32 = 0.5;
const TEMP_QUERY_GEN: f32 = 1.0;
const TEMP_ANALYSIS: f32 = 0.1;
const TEMP_VOTING: f32 = 0.2;
const TEMP_ANSWER: f32 = 0.1;

// =============================================================================
// ERRORS
// =============================================================================

/// Fatal pipeline failures. Retrieval failures never appear here; they
/// degrade to empty document sets inside the retriever.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("LLM backend call failed: {0}")]
    Llm(#[from] ProviderError),
}

// =============================================================================
// PIPELINE
// =============================================================================

/// One configured QA pipeline. The `voting_enabled` and `queries_generate`
/// flags are fixed per instance, not per request.
pub struct QaPipeline {
    prompts: Arc<PromptSet>,
    retriever: ApiRetriever,
    classifier_llm: StageLlm,
    query_gen_llm: StageLlm,
    analysis_llm: StageLlm,
    voting_llm: StageLlm,
    answer_llm: StageLlm,
    voting_enabled: bool,
    queries_generate: bool,
}

impl QaPipeline {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        retriever: ApiRetriever,
        prompts: Arc<PromptSet>,
        params: &Parameters,
        voting_enabled: bool,
        queries_generate: bool,
    ) -> Self {
        Self {
            prompts,
            retriever,
            classifier_llm: StageLlm::new(gateway.clone(), &params.classifier_model, TEMP_CLASSIFIER),
            query_gen_llm: StageLlm::new(gateway.clone(), &params.query_gen_model, TEMP_QUERY_GEN),
            analysis_llm: StageLlm::new(gateway.clone(), &params.analysis_model, TEMP_ANALYSIS),
            voting_llm: StageLlm::new(gateway.clone(), &params.voting_model, TEMP_VOTING),
            answer_llm: StageLlm::new(gateway, &params.answer_model, TEMP_ANSWER),
            voting_enabled,
            queries_generate,
        }
    }

    /// Run the full pipeline for one query and return the final answer text.
    ///
    /// The trace record is written exactly once, at run completion; a fatal
    /// LLM failure leaves no record, matching the accepted-loss policy.
    pub async fn run(
        &self,
        query: &str,
        alias: &str,
        trace: &dyn TraceHandler,
    ) -> Result<String, PipelineError> {
        let code = self.classify(query, trace).await?;
        tracing::debug!(code, "query classified");

        let answer = match code {
            1 => GREETING_REPLY.to_string(),
            2 => CLOSING_REPLY.to_string(),
            3 | 4 => self.answer_with_documents(query, alias, trace).await?,
            _ => {
                tracing::debug!(code, "unrecognized intent code");
                CLARIFY_REPLY.to_string()
            }
        };

        trace.finalize(serde_json::json!({ "final_answer": answer }));
        Ok(answer)
    }

    async fn answer_with_documents(
        &self,
        query: &str,
        alias: &str,
        trace: &dyn TraceHandler,
    ) -> Result<String, PipelineError> {
        let documents = self.expand_and_retrieve(query, alias, trace).await?;
        tracing::debug!(count = documents.len(), "documents retrieved");

        let analysis_note = self.analyze(query, &documents, trace).await?;

        if self.voting_enabled && !self.vote(query, &analysis_note, &documents, trace).await? {
            tracing::debug!("voting rejected the analysis note");
            return Ok(NO_ANSWER.to_string());
        }

        self.generate_answer(query, &analysis_note, &documents, trace)
            .await
    }

    /// Classify the query into an intent code. See [`parse::parse_classification`]
    /// for the fail-open parse.
    pub async fn classify(
        &self,
        query: &str,
        trace: &dyn TraceHandler,
    ) -> Result<i32, PipelineError> {
        let prompt = render(&self.prompts.classification, &[("query", query)]);
        let text = self
            .complete_traced(&self.classifier_llm, prompt, trace)
            .await?;
        Ok(parse::parse_classification(&text))
    }

    /// Optionally expand the query into alternate phrasings, fan out one
    /// retrieval per candidate concurrently, and merge by content.
    pub async fn expand_and_retrieve(
        &self,
        query: &str,
        alias: &str,
        trace: &dyn TraceHandler,
    ) -> Result<Vec<Document>, PipelineError> {
        let generated = if self.queries_generate {
            let prompt = render(&self.prompts.query_generation, &[("query", query)]);
            self.complete_traced(&self.query_gen_llm, prompt, trace)
                .await?
        } else {
            String::new()
        };

        let candidates = expand::candidate_queries(query, &generated);

        // All fetches dispatched before any is awaited; a slow or failed
        // candidate never blocks its siblings.
        let fetches = candidates
            .iter()
            .map(|candidate| self.retriever.retrieve(candidate, alias));
        let results = join_all(fetches).await;

        Ok(expand::merge_documents(results))
    }

    /// Synthesize the analysis note. A backend failure here is fatal.
    pub async fn analyze(
        &self,
        query: &str,
        documents: &[Document],
        trace: &dyn TraceHandler,
    ) -> Result<String, PipelineError> {
        let fragments = format_documents(documents);
        let prompt = render(
            &self.prompts.validation_plan,
            &[("query", query), ("best_fragments_str", &fragments)],
        );
        self.complete_traced(&self.analysis_llm, prompt, trace)
            .await
            .map_err(Into::into)
    }

    /// Judge whether the analysis note contains a satisfactory answer.
    pub async fn vote(
        &self,
        query: &str,
        analysis_note: &str,
        documents: &[Document],
        trace: &dyn TraceHandler,
    ) -> Result<bool, PipelineError> {
        let fragments = format_documents(documents);
        let prompt = render(
            &self.prompts.validation_voting,
            &[
                ("query", query),
                ("analysis_note", analysis_note),
                ("best_fragments", &fragments),
            ],
        );
        let text = self.complete_traced(&self.voting_llm, prompt, trace).await?;
        Ok(parse::parse_vote(&text))
    }

    /// Produce the user-facing answer text.
    pub async fn generate_answer(
        &self,
        query: &str,
        analysis_note: &str,
        documents: &[Document],
        trace: &dyn TraceHandler,
    ) -> Result<String, PipelineError> {
        let template = if self.voting_enabled {
            &self.prompts.answer_generation
        } else {
            &self.prompts.answer_generation_with_voting
        };

        let fragments = format_documents(documents);
        let prompt = render(
            template,
            &[
                ("query", query),
                ("analysis_note", analysis_note),
                ("best_fragments", &fragments),
            ],
        );
        self.complete_traced(&self.answer_llm, prompt, trace)
            .await
            .map_err(Into::into)
    }

    async fn complete_traced(
        &self,
        llm: &StageLlm,
        prompt: String,
        trace: &dyn TraceHandler,
    ) -> Result<String, ProviderError> {
        trace.record_step(StepEvent::LlmStart {
            prompts: vec![prompt.clone()],
        });
        let response = llm.complete_text(&prompt).await?;
        trace.record_step(StepEvent::LlmEnd {
            response: response.clone(),
        });
        Ok(response)
    }
}

/// Format the document set for prompt injection: per document its title,
/// source link, and fragment text; documents separated by blank lines.
pub fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| {
            format!(
                "Title: {}\nSource: {}\nFragment: {}",
                d.title, d.source, d.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_documents_separates_with_blank_lines() {
        let docs = vec![
            Document {
                content: "first fragment".to_string(),
                source: "https://a".to_string(),
                title: "A".to_string(),
                doc_id: None,
                mod_id: None,
            },
            Document {
                content: "second fragment".to_string(),
                source: "https://b".to_string(),
                title: "B".to_string(),
                doc_id: None,
                mod_id: None,
            },
        ];

        let formatted = format_documents(&docs);
        assert_eq!(
            formatted,
            "Title: A\nSource: https://a\nFragment: first fragment\n\n\
             Title: B\nSource: https://b\nFragment: second fragment"
        );
    }

    #[test]
    fn format_documents_empty_set_is_empty_string() {
        assert_eq!(format_documents(&[]), "");
    }
}
