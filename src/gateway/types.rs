//! Core types for the LLM gateway.

use std::time::Duration;

/// Request for a text completion.
///
/// The backend is treated as a black-box text-completion service: one user
/// prompt in, raw text out.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier, e.g. "openai/gpt-4o-mini".
    pub model: String,
    /// The prompt to complete.
    pub prompt: String,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: 0.0,
        }
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }
}

/// Response from a completion request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content.
    pub content: String,
    /// Input tokens consumed, when reported by the provider.
    pub input_tokens: u32,
    /// Output tokens generated, when reported by the provider.
    pub output_tokens: u32,
    /// Time taken for the request.
    pub latency: Duration,
}
