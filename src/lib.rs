//! Perplexity Ask - MCP server for Perplexity Sonar
//!
//! Exposes `perplexity_ask`, `perplexity_research` and `perplexity_reason`
//! over the MCP SSE transport and a session-less JSON-RPC endpoint.

pub mod completion;
pub mod error;
pub mod mcp;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
