//! LLM gateway: trait seam, OpenAI-compatible adapter, and per-stage clients.

pub mod error;
pub mod openai;
pub mod types;

use std::sync::Arc;

use openai::ChatProvider;

pub use error::ProviderError;
pub use openai::OpenAiAdapter;
pub use types::*;

/// Seam for issuing chat completions. Mocked in tests; implemented by
/// [`OpenAiAdapter`] in production.
#[async_trait::async_trait]
pub trait ChatGateway: Send + Sync {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

#[async_trait::async_trait]
impl ChatGateway for OpenAiAdapter {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        ChatProvider::complete(self, &req).await
    }
}

/// A text-completion client bound to one model and temperature.
///
/// Each pipeline stage owns one of these; the gateway behind them is shared.
#[derive(Clone)]
pub struct StageLlm {
    gateway: Arc<dyn ChatGateway>,
    model: String,
    temperature: f32,
}

impl StageLlm {
    pub fn new(gateway: Arc<dyn ChatGateway>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            gateway,
            model: model.into(),
            temperature,
        }
    }

    /// Issue one completion for a single prompt and return the raw text.
    pub async fn complete_text(&self, prompt: &str) -> Result<String, ProviderError> {
        let req = CompletionRequest::new(&self.model, prompt).temperature(self.temperature);

        let resp = self.gateway.complete(req).await.map_err(|e| {
            tracing::warn!(model = %self.model, code = e.code(), "completion failed");
            e
        })?;

        tracing::debug!(
            model = %self.model,
            input_tokens = resp.input_tokens,
            output_tokens = resp.output_tokens,
            latency_ms = resp.latency.as_millis() as u64,
            "completion finished"
        );

        Ok(resp.content)
    }
}
