use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use crate::consts::{DEFAULT_MAX_LEN, DEFAULT_PROMPT};
use crate::error::{Result, TaskError};
use crate::prompts::{render, truncate_content};
use crate::provider::{ChatProvider, ChatRequest};

/// Arguments for `with_prompt`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WithPromptArgs {
    pub target: PathBuf,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Truncation budget. Zero or negative disables truncation.
    #[serde(default = "default_max_len")]
    pub max_len: i64,
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_max_len() -> i64 {
    DEFAULT_MAX_LEN
}

impl WithPromptArgs {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            prompt: default_prompt(),
            max_len: default_max_len(),
        }
    }
}

/// Read the target file and build the message that will be sent.
pub async fn build_message(args: &WithPromptArgs) -> Result<String> {
    let content = tokio::fs::read_to_string(&args.target)
        .await
        .map_err(|source| TaskError::Io {
            path: args.target.clone(),
            source,
        })?;
    let content = truncate_content(&content, &args.prompt, args.max_len);
    render(&args.prompt, content)
}

/// Send the templated file content to the provider and return its reply.
pub async fn with_prompt(provider: &dyn ChatProvider, args: &WithPromptArgs) -> Result<String> {
    let msg = build_message(args).await?;
    info!(message = %msg, "prompt built");
    Ok(provider.chat(&ChatRequest::new(msg)).await?)
}
