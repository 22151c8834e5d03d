//! Error types for the Perplexity Ask server

use thiserror::Error;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, Error>;

/// JSON-RPC error codes used on the wire
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// Tool call carried no argument bag
    #[error("No arguments provided")]
    MissingArguments,

    /// Malformed tool arguments (`messages` of the wrong shape)
    #[error("{0}")]
    Argument(String),

    /// Transport failure reaching the provider
    #[error("Network error while calling Perplexity API: {0}")]
    Network(String),

    /// Non-2xx HTTP status from the provider
    #[error("Perplexity API error: {status} {status_text}\n{body}")]
    Upstream {
        status: u16,
        status_text: String,
        body: String,
    },

    /// Provider body could not be decoded
    #[error("Failed to parse JSON response from Perplexity API: {0}")]
    Decode(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Envelope is not a valid JSON-RPC 2.0 request
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("No transport found for sessionId: {0}")]
    SessionNotFound(String),

    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Client stopped draining its event stream
    #[error("Session queue full: {0}")]
    SessionFull(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for the JSON-RPC envelope
    pub fn code(&self) -> i64 {
        match self {
            Error::MissingArguments | Error::Argument(_) => codes::INVALID_PARAMS,
            Error::UnknownTool(_) | Error::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            Error::InvalidRequest(_) => codes::INVALID_REQUEST,
            _ => codes::INTERNAL_ERROR,
        }
    }

    /// Whether the failure came from the caller rather than the server or provider
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MissingArguments
                | Error::Argument(_)
                | Error::UnknownTool(_)
                | Error::InvalidRequest(_)
                | Error::MethodNotFound(_)
        )
    }

    /// HTTP status code of an upstream failure, if any
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}
