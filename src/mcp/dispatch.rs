//! Tool dispatch: argument validation and model routing

use std::sync::Arc;

use serde_json::Value;

use super::protocol::ToolCallResult;
use super::tools::Tool;
use crate::completion::CompletionProvider;
use crate::error::{Error, Result};
use crate::types::Message;

/// Routes tool calls to the completion provider
#[derive(Clone)]
pub struct ToolDispatcher {
    provider: Arc<dyn CompletionProvider>,
}

impl ToolDispatcher {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Dispatch by wire name.
    ///
    /// An unknown name is not a failure: it yields an `isError` result with
    /// `Unknown tool: <name>`. Missing or malformed arguments and provider
    /// failures are returned as errors for the caller to report.
    pub async fn invoke(&self, name: &str, arguments: Option<&Value>) -> Result<ToolCallResult> {
        let arguments = require_arguments(arguments)?;
        match Tool::from_name(name) {
            Some(tool) => self.call(tool, Some(arguments)).await,
            None => {
                tracing::debug!(tool = name, "Unknown tool requested");
                Ok(ToolCallResult::error(format!("Unknown tool: {}", name)))
            }
        }
    }

    /// Validate `arguments` for `tool` and run the completion with its model
    pub async fn call(&self, tool: Tool, arguments: Option<&Value>) -> Result<ToolCallResult> {
        let messages = parse_arguments(tool, arguments)?;
        tracing::debug!(
            tool = tool.name(),
            model = tool.model(),
            messages = messages.len(),
            "Dispatching tool call"
        );
        let text = self.provider.complete(&messages, tool.model()).await?;
        Ok(ToolCallResult::text(text))
    }
}

fn require_arguments(arguments: Option<&Value>) -> Result<&Value> {
    match arguments {
        None | Some(Value::Null) => Err(Error::MissingArguments),
        Some(value) => Ok(value),
    }
}

/// Validate a tool's argument bag and extract its conversation.
///
/// `messages` must be an array whose items all carry string `role` and
/// `content` fields. Other arguments are ignored.
pub fn parse_arguments(tool: Tool, arguments: Option<&Value>) -> Result<Vec<Message>> {
    let arguments = require_arguments(arguments)?;

    let items = arguments
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            Error::Argument(format!(
                "Invalid arguments for {}: 'messages' must be an array",
                tool
            ))
        })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<Message>(item.clone()).map_err(|_| {
                Error::Argument(format!(
                    "Invalid arguments for {}: 'messages[{}]' must have string 'role' and 'content'",
                    tool, i
                ))
            })
        })
        .collect()
}
