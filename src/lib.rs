pub mod consts;
pub mod engine;
pub mod error;
pub mod logging;
pub mod operators;
pub mod prompts;
pub mod provider;
pub mod task;
