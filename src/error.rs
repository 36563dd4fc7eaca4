//! Error taxonomy for a single task invocation.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a task. Variants are distinct so callers can
/// tell a bad config from a bad operator name from a failed chat call.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Malformed JSON, or a `TaskConfig` with missing, mistyped or unknown fields.
    #[error("invalid task config: {0}")]
    Config(#[source] serde_json::Error),

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// `kwargs` do not fit the selected operator's parameters.
    #[error("invalid arguments for operator {operator}: {source}")]
    ArgumentMismatch {
        operator: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid prompt template: {0}")]
    Template(String),

    /// The chat provider failed. The provider's own message is shown as-is.
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TaskError>;
