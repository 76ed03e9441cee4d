#![forbid(unsafe_code)]

//! # expert-qa
//!
//! Question-answering orchestration service. An inbound query is classified
//! by intent, optionally expanded into alternate search phrasings, matched
//! against an external document-ranking API with a concurrent fan-out, and
//! answered by a chain of LLM calls (analysis note → optional voting gate →
//! answer generation). Each run leaves one JSON trace file behind.
//!
//! Greeting/closing intents short-circuit to canned replies; retrieval
//! failures degrade to an empty document set; LLM backend failures are fatal
//! to their run.

pub mod config;
pub mod gateway;
pub mod pipeline;
pub mod prompts;
pub mod retriever;
pub mod server;
pub mod trace;

pub use config::{ConfigError, Parameters, Settings};
pub use gateway::{ChatGateway, OpenAiAdapter, ProviderError, StageLlm};
pub use pipeline::{PipelineError, QaPipeline, NO_ANSWER};
pub use prompts::{PromptError, PromptSet};
pub use retriever::{ApiRetriever, Document};
pub use server::{build_router, AppContext};
pub use trace::{FileTraceHandler, NoopTraceHandler, StepEvent, TraceHandler};
