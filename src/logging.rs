//! Tracing subscriber setup. Log lines go to stderr so stdout carries only the result.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::consts::DEFAULT_LOG_FILTER;

/// Build the filter: an explicit directive wins, then `RUST_LOG`, then the default.
pub fn filter(directive: Option<&str>) -> Result<EnvFilter> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter: {directive}")),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(directive: Option<&str>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(directive)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
}
