//! Service configuration: env-sourced secrets and defaulted parameters.

use thiserror::Error;

/// Startup configuration errors. Never recovered per-request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
}

/// Secrets and endpoint overrides sourced from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// API key for the LLM backend.
    pub llm_api_key: String,
    /// Base URL of the OpenAI-compatible inference endpoint.
    pub llm_base_url: String,
    /// Bearer token for the document-ranking API.
    pub retrieval_token: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let llm_api_key =
            std::env::var("LLM_API_KEY").map_err(|_| ConfigError::MissingEnv("LLM_API_KEY"))?;

        let llm_base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.vsegpt.ru:7090/v1".to_string());

        let retrieval_token =
            std::env::var("RETRIEVAL_TOKEN").unwrap_or_else(|_| "token123".to_string());

        Ok(Self {
            llm_api_key,
            llm_base_url,
            retrieval_token,
        })
    }
}

/// Fixed application parameters. Read-only after process start.
#[derive(Debug, Clone)]
pub struct Parameters {
    /// Base URL of the document-ranking API.
    pub retrieval_base_url: String,
    /// Endpoint path of the document-ranking API.
    pub retrieval_endpoint: String,
    /// Model names per pipeline stage.
    pub classifier_model: String,
    pub query_gen_model: String,
    pub analysis_model: String,
    pub voting_model: String,
    pub answer_model: String,
    /// Directory for per-run trace files.
    pub trace_dir: String,
    /// Path to the prompt template file.
    pub prompts_path: String,
    /// Bind address for the HTTP server.
    pub host: String,
    pub port: u16,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            retrieval_base_url: "http://0.0.0.0:8000".to_string(),
            retrieval_endpoint: "/query/".to_string(),
            classifier_model: "openai/gpt-4o-mini".to_string(),
            query_gen_model: "openai/gpt-4o-mini".to_string(),
            analysis_model: "openai/gpt-4o-mini".to_string(),
            voting_model: "openai/gpt-4o-mini".to_string(),
            answer_model: "openai/gpt-4o-mini".to_string(),
            trace_dir: "data/memory".to_string(),
            prompts_path: "configs/prompts.json".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}
