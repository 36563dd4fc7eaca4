pub mod runner;

use async_trait::async_trait;

use crate::error::Result;
use crate::task::TaskInput;

/// The outermost boundary. main.rs only knows this trait.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn run(&self, input: TaskInput) -> Result<String>;
}
