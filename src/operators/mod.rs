//! The closed set of operators a task can name.
//!
//! [`Operator`] is resolved from the task's `operator` string, then
//! [`Operator::bind`] turns the untyped `kwargs` into the operator's own
//! argument struct. [`OperatorRegistry`] owns the shared chat provider and
//! runs bound [`Invocation`]s against it.

pub mod chat;
pub mod with_prompt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, TaskError};
use crate::provider::ChatProvider;

pub use chat::ChatArgs;
pub use with_prompt::WithPromptArgs;

/// A named unit of work. The set is fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Forward a message straight to the chat assistant.
    DdgChat,
    /// Summarize a local file through the chat assistant.
    WithPrompt,
}

impl Operator {
    pub const ALL: [Operator; 2] = [Operator::DdgChat, Operator::WithPrompt];

    pub fn name(self) -> &'static str {
        match self {
            Operator::DdgChat => "ddg.chat",
            Operator::WithPrompt => "with_prompt",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Operator::DdgChat => {
                "Chat with the DuckDuckGo assistant. Args: {\"keywords\": \"<message>\", \"model\"?: \"<alias>\", \"timeout\"?: <seconds>}"
            }
            Operator::WithPrompt => {
                "Send a file's content through a prompt template to the assistant. Args: {\"target\": \"<path>\", \"prompt\"?: \"<template with {content}>\", \"max_len\"?: <int>}"
            }
        }
    }

    /// Every operator with its description. Needs no provider.
    pub fn descriptions() -> Vec<OperatorDescription> {
        Operator::ALL
            .into_iter()
            .map(|op| OperatorDescription {
                name: op.name(),
                description: op.description(),
            })
            .collect()
    }

    /// Deserialize `kwargs` into this operator's argument struct.
    pub fn bind(self, kwargs: Map<String, Value>) -> Result<Invocation> {
        match self {
            Operator::DdgChat => Ok(Invocation::Chat(self.decode(kwargs)?)),
            Operator::WithPrompt => Ok(Invocation::WithPrompt(self.decode(kwargs)?)),
        }
    }

    fn decode<T: DeserializeOwned>(self, kwargs: Map<String, Value>) -> Result<T> {
        serde_json::from_value(Value::Object(kwargs)).map_err(|source| {
            TaskError::ArgumentMismatch {
                operator: self.name(),
                source,
            }
        })
    }
}

impl FromStr for Operator {
    type Err = TaskError;

    fn from_str(name: &str) -> Result<Self> {
        Operator::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| TaskError::UnknownOperator(name.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operator bound to its typed arguments, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Chat(ChatArgs),
    WithPrompt(WithPromptArgs),
}

impl Invocation {
    pub fn operator(&self) -> Operator {
        match self {
            Invocation::Chat(_) => Operator::DdgChat,
            Invocation::WithPrompt(_) => Operator::WithPrompt,
        }
    }
}

/// Describes an operator for listings.
#[derive(Debug, Clone)]
pub struct OperatorDescription {
    pub name: &'static str,
    pub description: &'static str,
}

/// Resolves operator names and runs invocations against one shared provider.
pub struct OperatorRegistry {
    provider: Arc<dyn ChatProvider>,
}

impl OperatorRegistry {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    pub fn resolve(&self, name: &str) -> Result<Operator> {
        name.parse()
    }

    pub async fn invoke(&self, invocation: Invocation) -> Result<String> {
        match invocation {
            Invocation::Chat(args) => chat::chat(self.provider.as_ref(), &args).await,
            Invocation::WithPrompt(args) => {
                with_prompt::with_prompt(self.provider.as_ref(), &args).await
            }
        }
    }

    pub fn descriptions(&self) -> Vec<OperatorDescription> {
        Operator::descriptions()
    }
}
