//! Core types shared by the gateway, dispatcher and transports

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default Perplexity API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// A single chat message passed through to the provider.
///
/// `role` is an open set (`system`, `user`, `assistant` in practice) and is
/// forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Perplexity API key (bearer credential)
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Provider base URL; `/chat/completions` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ServerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            host: default_host(),
            port: default_port(),
        }
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config(
                "PERPLEXITY_API_KEY environment variable is required".to_string(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Invalid provider base URL '{}': expected http:// or https://",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Socket address to listen on
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen address: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserialize_requires_role_and_content() {
        let msg: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(msg, Message::user("hi"));

        assert!(serde_json::from_str::<Message>(r#"{"role":"user"}"#).is_err());
        assert!(serde_json::from_str::<Message>(r#"{"role":"user","content":5}"#).is_err());
    }

    #[test]
    fn test_config_validate() {
        assert!(ServerConfig::new("pplx-123").validate().is_ok());
        assert!(matches!(
            ServerConfig::new("  ").validate(),
            Err(Error::Config(_))
        ));

        let mut config = ServerConfig::new("pplx-123");
        config.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_listen_addr_defaults() {
        let config = ServerConfig::new("k");
        assert_eq!(config.listen_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_config_does_not_serialize_api_key() {
        let json = serde_json::to_value(ServerConfig::new("secret")).unwrap();
        assert!(json.get("api_key").is_none());
        assert_eq!(json["port"], 8080);
    }
}
