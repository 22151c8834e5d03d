//! MCP tool definitions and model routing

use serde_json::json;

use super::protocol::ToolDefinition;

/// Input schema shared by every tool: a conversation of role/content messages
const MESSAGES_SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "messages": {
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "role": {"type": "string", "description": "Role of the message (e.g., system, user, assistant)"},
                    "content": {"type": "string", "description": "The content of the message"}
                },
                "required": ["role", "content"]
            },
            "description": "Array of conversation messages"
        }
    },
    "required": ["messages"]
}"#;

/// All tool definitions, in listing order
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    (
        "perplexity_ask",
        "Engages in a conversation using the Sonar API. Accepts an array of messages (each with a role and content) and returns a ask completion response from the Perplexity model.",
        MESSAGES_SCHEMA,
    ),
    (
        "perplexity_research",
        "Performs deep research using the Perplexity API. Accepts an array of messages (each with a role and content) and returns a comprehensive research response with citations.",
        MESSAGES_SCHEMA,
    ),
    (
        "perplexity_reason",
        "Performs reasoning tasks using the Perplexity API. Accepts an array of messages (each with a role and content) and returns a well-reasoned response using the sonar-reasoning-pro model.",
        MESSAGES_SCHEMA,
    ),
];

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}

/// A registered tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ask,
    Research,
    Reason,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Ask, Tool::Research, Tool::Reason];

    /// Look up a tool by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "perplexity_ask" => Some(Tool::Ask),
            "perplexity_research" => Some(Tool::Research),
            "perplexity_reason" => Some(Tool::Reason),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tool::Ask => "perplexity_ask",
            Tool::Research => "perplexity_research",
            Tool::Reason => "perplexity_reason",
        }
    }

    /// Sonar model the tool is pinned to
    pub fn model(self) -> &'static str {
        match self {
            Tool::Ask => "sonar-pro",
            Tool::Research => "sonar-deep-research",
            Tool::Reason => "sonar-reasoning-pro",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
