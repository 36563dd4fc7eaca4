pub mod duckduckgo;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One chat call: the user message plus optional per-call overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub keywords: String,
    /// Model alias. `None` uses the provider's configured default.
    pub model: Option<String>,
    /// Request timeout. `None` uses the provider's configured default.
    pub timeout: Option<Duration>,
}

impl ChatRequest {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            model: None,
            timeout: None,
        }
    }
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// The external conversational search assistant. Could be DuckDuckGo or a test script.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<String>;
}
