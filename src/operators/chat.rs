use serde::Deserialize;
use std::time::Duration;

use crate::error::Result;
use crate::provider::{ChatProvider, ChatRequest};

/// Arguments for `ddg.chat`, mirroring the provider's chat call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatArgs {
    pub keywords: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl From<&ChatArgs> for ChatRequest {
    fn from(args: &ChatArgs) -> Self {
        ChatRequest {
            keywords: args.keywords.clone(),
            model: args.model.clone(),
            timeout: args.timeout.map(Duration::from_secs),
        }
    }
}

/// Forward the message to the provider and return its reply unmodified.
pub async fn chat(provider: &dyn ChatProvider, args: &ChatArgs) -> Result<String> {
    Ok(provider.chat(&ChatRequest::from(args)).await?)
}
