//! HTTP transports (SSE sessions and direct calls)

mod direct;
mod server;
mod session;

pub use direct::{error_response, handle_direct_call};
pub use server::{AppState, McpHttpServer, DIRECT_CALL_PATH, MESSAGES_PATH, SSE_PATH};
pub use session::{Session, SessionEvent, SessionId, SessionManager, SessionStream};
