#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expert_qa::config::{Parameters, Settings};
use expert_qa::gateway::OpenAiAdapter;
use expert_qa::pipeline::QaPipeline;
use expert_qa::prompts::PromptSet;
use expert_qa::retriever::ApiRetriever;
use expert_qa::server::{build_router, AppContext};

#[derive(Parser)]
#[command(name = "expertd", version, about = "Expert QA orchestration service")]
struct Cli {
    /// Path to the prompt template JSON file
    #[arg(long, env = "PROMPTS_PATH")]
    prompts: Option<PathBuf>,

    /// Directory for per-run trace files
    #[arg(long, env = "TRACE_DIR")]
    trace_dir: Option<PathBuf>,

    /// Base URL of the document-ranking API
    #[arg(long, env = "RETRIEVAL_BASE_URL")]
    retrieval_url: Option<String>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(long)]
    port: Option<u16>,

    /// Gate answers behind the voting stage
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    voting: bool,

    /// Expand each query into alternate search phrasings
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    expand_queries: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,expert_qa=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut params = Parameters::default();
    if let Some(prompts) = cli.prompts {
        params.prompts_path = prompts.display().to_string();
    }
    if let Some(trace_dir) = cli.trace_dir {
        params.trace_dir = trace_dir.display().to_string();
    }
    if let Some(url) = cli.retrieval_url {
        params.retrieval_base_url = url;
    }
    if let Some(host) = cli.host {
        params.host = host;
    }
    if let Some(port) = cli.port {
        params.port = port;
    }

    let settings = Settings::from_env().context("Failed to load settings")?;

    let prompts = Arc::new(
        PromptSet::from_file(&params.prompts_path).context("Failed to load prompt templates")?,
    );
    tracing::info!(path = %params.prompts_path, "prompt templates loaded");

    let gateway = OpenAiAdapter::new(&settings.llm_api_key, &settings.llm_base_url)
        .context("Failed to create LLM gateway")?;

    let retriever = ApiRetriever::new(
        &params.retrieval_base_url,
        &params.retrieval_endpoint,
        &settings.retrieval_token,
    );

    let pipeline = QaPipeline::new(
        Arc::new(gateway),
        retriever,
        prompts,
        &params,
        cli.voting,
        cli.expand_queries,
    );

    let ctx = Arc::new(AppContext {
        pipeline,
        trace_dir: PathBuf::from(&params.trace_dir),
    });

    let addr = format!("{}:{}", params.host, params.port);
    tracing::info!(%addr, voting = cli.voting, expand_queries = cli.expand_queries, "starting server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, build_router(ctx))
        .await
        .context("Server error")?;

    Ok(())
}
