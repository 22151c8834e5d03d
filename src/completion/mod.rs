//! Completion gateway for the Perplexity Sonar API
//!
//! Wraps the single outbound `POST /chat/completions` call:
//! - transport failures become [`Error::Network`]
//! - non-2xx statuses become [`Error::Upstream`] (status, reason, body)
//! - undecodable bodies become [`Error::Decode`]
//!
//! Successful answers get a numbered citation footer when the provider
//! returns source references. There are no retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Message, DEFAULT_BASE_URL};

/// Body used when an error response cannot be read
const UNREADABLE_BODY: &str = "Unable to parse error response";

/// Anything that can turn a conversation into an answer
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run a chat completion with `model` and return the answer text,
    /// citation footer included.
    async fn complete(&self, messages: &[Message], model: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Perplexity chat completion client
pub struct PerplexityClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PerplexityClient {
    /// Create a client against the public Perplexity API
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against an OpenAI-compatible endpoint at `base_url`
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionProvider for PerplexityClient {
    async fn complete(&self, messages: &[Message], model: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&ChatCompletionRequest { model, messages })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(model, "Perplexity request failed: {}", e);
                Error::Network(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
            tracing::warn!(model, status = status.as_u16(), "Perplexity API error");
            return Err(Error::Upstream {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Decode(e.to_string()))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Decode("response contained no choices".to_string()))?;

        tracing::debug!(model, "Perplexity completion succeeded");
        Ok(append_citations(content, data.citations.as_deref().unwrap_or(&[])))
    }
}

/// Append a `Citations:` footer listing each citation with a 1-based index.
///
/// Text is returned unchanged when there are no citations.
pub fn append_citations(mut text: String, citations: &[String]) -> String {
    if citations.is_empty() {
        return text;
    }

    text.push_str("\n\nCitations:\n");
    for (i, citation) in citations.iter().enumerate() {
        text.push_str(&format!("[{}] {}\n", i + 1, citation));
    }
    text
}
