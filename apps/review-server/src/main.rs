//! ADGM Review Server
//!
//! Accepts batches of `.docx` filings and returns, per batch:
//!
//! - The document type of every file and the legal process they add up to
//! - Checklist verification against the documents that process requires
//! - Reviewer-annotated copies of every file with findings
//! - A legal explanation from the retrieval + language-model collaborator
//!
//! ## Architecture
//!
//! Document work (classify, scan, annotate) runs on a blocking thread inside a
//! per-request temporary directory. The explanation call is optional and bounded
//! by `--explain-timeout-ms`; without an index or API key a placeholder is returned.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use compliance_engine::ComplianceEngine;
use corpus_core::{config, RagConfig, RagContext};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_health, handle_list_document_types, handle_review, handle_scan};

/// Largest accepted request body (base64 inflates uploads by a third)
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Command-line arguments for the review server
#[derive(Parser, Debug)]
#[command(name = "review-server")]
#[command(about = "ADGM corporate filing review server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Base URL of the ADGM knowledge index service
    #[arg(long, env = "ADGM_INDEX_URL")]
    index_url: Option<String>,

    /// Language-model API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    llm_api_key: Option<String>,

    /// Chat model used for explanations
    #[arg(long, default_value = config::DEFAULT_MODEL)]
    llm_model: String,

    /// OpenAI-compatible chat-completions base URL
    #[arg(long, default_value = config::DEFAULT_BASE_URL)]
    llm_base_url: String,

    /// Explanation timeout in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_MS)]
    explain_timeout_ms: u64,

    /// Passages retrieved per explanation
    #[arg(long, default_value_t = config::DEFAULT_TOP_K)]
    top_k: usize,
}

impl Args {
    fn rag_config(&self) -> RagConfig {
        let mut config = RagConfig::default()
            .with_model(&self.llm_model)
            .with_base_url(&self.llm_base_url)
            .with_top_k(self.top_k)
            .with_timeout(Duration::from_millis(self.explain_timeout_ms));
        if let Some(url) = &self.index_url {
            config = config.with_index_url(url);
        }
        if let Some(key) = &self.llm_api_key {
            config = config.with_api_key(key);
        }
        config
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ComplianceEngine>,
    pub rag: RagContext,
}

/// Routes without the transport middleware
pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/document-types", get(handle_list_document_types))
        .route("/api/scan", post(handle_scan))
        .route("/api/review", post(handle_review))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting review server on {}:{}", args.host, args.port);

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit.saturating_mul(2))
            .finish()
            .ok_or_else(|| anyhow!("Invalid rate limit: {}", args.rate_limit))?,
    );

    let state = AppState {
        engine: Arc::new(ComplianceEngine::new()),
        rag: RagContext::from_config(&args.rag_config()),
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api_router(state)
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Explanation timeout: {}ms", args.explain_timeout_ms);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
