//! MCP request handling for session (SSE) clients

use async_trait::async_trait;
use serde_json::{json, Value};

use super::dispatch::ToolDispatcher;
use super::protocol::{
    methods, InitializeResult, McpHandler, McpRequest, McpResponse, ToolCallResult,
};
use super::tools::get_tool_definitions;
use crate::error::codes;

/// Protocol runtime behind the SSE transport.
///
/// Tool calls always succeed at the JSON-RPC level; any failure is folded
/// into the result's `isError` flag.
#[derive(Clone)]
pub struct SessionHandler {
    dispatcher: ToolDispatcher,
}

impl SessionHandler {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    async fn call_tool(&self, params: &Value) -> ToolCallResult {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params.get("arguments");

        match self.dispatcher.invoke(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                if e.is_client_error() {
                    tracing::debug!(tool = name, "Rejected tool call: {}", e);
                } else {
                    tracing::error!(tool = name, "Tool call failed: {}", e);
                }
                ToolCallResult::from_error(&e)
            }
        }
    }
}

#[async_trait]
impl McpHandler for SessionHandler {
    async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() || request.method.starts_with(methods::NOTIFICATION_PREFIX) {
            // Notification, no response needed
            return None;
        }

        let response = match request.method.as_str() {
            methods::INITIALIZE => {
                McpResponse::success(request.id, json!(InitializeResult::default()))
            }
            methods::PING => McpResponse::success(request.id, json!({})),
            methods::LIST_TOOLS => {
                McpResponse::success(request.id, json!({"tools": get_tool_definitions()}))
            }
            methods::CALL_TOOL => {
                let result = self.call_tool(&request.params).await;
                McpResponse::success(request.id, json!(result))
            }
            _ => McpResponse::error(
                request.id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionProvider;
    use crate::error::{Error, Result};
    use crate::types::Message;
    use std::sync::Arc;

    struct EchoProvider;

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        async fn complete(&self, messages: &[Message], model: &str) -> Result<String> {
            if messages.is_empty() {
                return Err(Error::Network("connection refused".to_string()));
            }
            Ok(format!("{}: {}", model, messages[0].content))
        }
    }

    fn handler() -> SessionHandler {
        SessionHandler::new(ToolDispatcher::new(Arc::new(EchoProvider)))
    }

    fn request(method: &str, params: Value) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(7)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = handler()
            .handle_request(request("initialize", json!({})))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "perplexity-ask");
        assert_eq!(response.id, json!(7));
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let mut req = request("notifications/initialized", Value::Null);
        req.id = None;
        assert!(handler().handle_request(req).await.is_none());
    }

    #[tokio::test]
    async fn test_call_without_id_is_not_answered() {
        let mut req = request(
            "tools/call",
            json!({
                "name": "perplexity_ask",
                "arguments": {"messages": [{"role": "user", "content": "hi"}]}
            }),
        );
        req.id = None;
        assert!(handler().handle_request(req).await.is_none());
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = handler()
            .handle_request(request("tools/list", Value::Null))
            .await
            .unwrap();
        assert_eq!(response.result.unwrap()["tools"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_call_tool_success() {
        let params = json!({
            "name": "perplexity_reason",
            "arguments": {"messages": [{"role": "user", "content": "why"}]}
        });
        let response = handler()
            .handle_request(request("tools/call", params))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["text"], "sonar-reasoning-pro: why");
    }

    #[tokio::test]
    async fn test_call_tool_failures_are_results() {
        let cases = [
            (
                json!({"name": "perplexity_ask"}),
                "Error: No arguments provided",
            ),
            (
                json!({"name": "perplexity_ask", "arguments": {"messages": 1}}),
                "Error: Invalid arguments for perplexity_ask: 'messages' must be an array",
            ),
            (
                json!({"name": "perplexity_ask", "arguments": {"messages": []}}),
                "Error: Network error while calling Perplexity API: connection refused",
            ),
            (
                json!({"name": "other", "arguments": {"messages": []}}),
                "Unknown tool: other",
            ),
        ];

        for (params, expected) in cases {
            let response = handler()
                .handle_request(request("tools/call", params))
                .await
                .unwrap();
            assert!(response.error.is_none());
            let result = response.result.unwrap();
            assert_eq!(result["isError"], true);
            assert_eq!(result["content"][0]["text"], expected);
        }
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = handler()
            .handle_request(request("resources/list", Value::Null))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }
}
