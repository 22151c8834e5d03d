//! Direct JSON-RPC endpoint (`POST /api/tools/call`)
//!
//! Self-contained request/response calls that need no SSE session. Unlike
//! the session runtime, failures here are JSON-RPC errors with a 4xx/5xx
//! status, and an unknown tool name is `-32601` rather than an `isError`
//! result.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use super::server::AppState;
use crate::error::{codes, Error, Result};
use crate::mcp::{
    get_tool_definitions, methods, McpResponse, Tool, ToolDispatcher, JSONRPC_VERSION,
};

/// Handle `POST /api/tools/call`
pub async fn direct_call_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let envelope: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            let response =
                McpResponse::error(None, codes::PARSE_ERROR, format!("Parse error: {}", e));
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };
    let id = envelope.get("id").cloned();

    match handle_direct_call(&state.dispatcher, &envelope).await {
        Ok(result) => Json(McpResponse::success(id, result)).into_response(),
        Err(err) => {
            let (status, response) = error_response(id, &err);
            (status, Json(response)).into_response()
        }
    }
}

/// Run one direct call and return its JSON-RPC `result`
pub async fn handle_direct_call(dispatcher: &ToolDispatcher, envelope: &Value) -> Result<Value> {
    if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(Error::InvalidRequest("jsonrpc must be '2.0'".to_string()));
    }

    let method = envelope.get("method").and_then(Value::as_str).unwrap_or("");
    let params = envelope.get("params");

    match method {
        methods::LIST_TOOLS => Ok(json!({"tools": get_tool_definitions()})),
        methods::CALL_TOOL | methods::TOOL_CODE => {
            let name = params
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("");
            let arguments = params
                .and_then(|p| p.get("arguments"))
                .filter(|args| !args.is_null())
                .ok_or(Error::MissingArguments)?;
            let tool = Tool::from_name(name).ok_or_else(|| Error::UnknownTool(name.to_string()))?;

            let result = dispatcher.call(tool, Some(arguments)).await?;
            Ok(json!(result))
        }
        other => Err(Error::MethodNotFound(other.to_string())),
    }
}

/// Map an error to its HTTP status and JSON-RPC error body
pub fn error_response(id: Option<Value>, err: &Error) -> (StatusCode, McpResponse) {
    let message = match err {
        Error::MissingArguments => format!("Invalid params: {}", err),
        Error::Argument(msg) => msg.clone(),
        Error::UnknownTool(name) => format!("Method not found: {}", name),
        Error::InvalidRequest(_) | Error::MethodNotFound(_) => err.to_string(),
        _ => format!("Internal error: {}", err),
    };

    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("Error handling direct API request: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, McpResponse::error(id, err.code(), message))
}
