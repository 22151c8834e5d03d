//! Perplexity Ask MCP Server
//!
//! Run with: PERPLEXITY_API_KEY=... perplexity-ask-server

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perplexity_ask::completion::PerplexityClient;
use perplexity_ask::error::Result;
use perplexity_ask::transport::{AppState, McpHttpServer};
use perplexity_ask::types::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "perplexity-ask-server")]
#[command(about = "MCP server exposing Perplexity Sonar as tools over SSE and HTTP")]
struct Args {
    /// Perplexity API key
    #[arg(long, env = "PERPLEXITY_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Perplexity API base URL
    #[arg(long, env = "PERPLEXITY_BASE_URL", default_value = "https://api.perplexity.ai")]
    base_url: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    let config = ServerConfig {
        api_key: args.api_key,
        base_url: args.base_url,
        host: args.host,
        port: args.port,
    };
    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        return Err(e);
    }
    let addr = config.listen_addr()?;

    let provider = PerplexityClient::with_base_url(config.api_key.clone(), config.base_url.clone());
    let state = AppState::new(Arc::new(provider));

    tracing::info!(base_url = %config.base_url, "Perplexity MCP server starting...");
    McpHttpServer::new(state, addr).start().await?;

    Ok(())
}
