//! Task configuration: the `(operator, kwargs)` pair driving one invocation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Result, TaskError};

/// A parsed task. Both fields are required and nothing else is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    pub operator: String,
    pub kwargs: Map<String, Value>,
}

/// What a caller hands the runner: raw JSON text or an already-decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskInput {
    Raw(String),
    Value(Value),
}

impl TaskInput {
    /// Decode (if needed) and strictly construct the [`TaskConfig`].
    pub fn into_config(self) -> Result<TaskConfig> {
        let value = match self {
            TaskInput::Raw(text) | TaskInput::Value(Value::String(text)) => {
                serde_json::from_str(&text).map_err(TaskError::Config)?
            }
            TaskInput::Value(value) => value,
        };
        serde_json::from_value(value).map_err(TaskError::Config)
    }
}

impl From<&str> for TaskInput {
    fn from(text: &str) -> Self {
        TaskInput::Raw(text.to_string())
    }
}

impl From<String> for TaskInput {
    fn from(text: String) -> Self {
        TaskInput::Raw(text)
    }
}

impl From<Value> for TaskInput {
    fn from(value: Value) -> Self {
        TaskInput::Value(value)
    }
}

impl fmt::Display for TaskInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskInput::Raw(text) => f.write_str(text),
            TaskInput::Value(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for TaskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TaskConfig(operator={}, kwargs={})",
            self.operator,
            Value::Object(self.kwargs.clone())
        )
    }
}
