use async_trait::async_trait;
use tracing::info;

use super::Engine;
use crate::error::Result;
use crate::operators::OperatorRegistry;
use crate::task::TaskInput;

/// Parses a task, resolves its operator, binds the arguments and runs it.
///
/// Every validation step happens before the operator touches the
/// filesystem or the provider. The first error ends the run.
pub struct TaskRunner {
    operators: OperatorRegistry,
}

impl TaskRunner {
    pub fn new(operators: OperatorRegistry) -> Self {
        Self { operators }
    }
}

#[async_trait]
impl Engine for TaskRunner {
    async fn run(&self, input: TaskInput) -> Result<String> {
        info!(input = %input, "task received");

        let config = input.into_config()?;
        info!(config = %config, "task config");

        let operator = self.operators.resolve(&config.operator)?;
        let invocation = operator.bind(config.kwargs)?;

        let result = self.operators.invoke(invocation).await?;
        info!(operator = %operator, result = %result, "task finished");

        Ok(result)
    }
}
