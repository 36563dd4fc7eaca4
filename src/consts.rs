//! Project-wide constants.

use std::time::Duration;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Template used by `with_prompt` when none is given.
pub const DEFAULT_PROMPT: &str = "summarize the following:\n\n {content}";

/// Truncation budget used by `with_prompt` when none is given.
pub const DEFAULT_MAX_LEN: i64 = 1024;

/// Default chat model alias.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default per-request timeout for the chat provider.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default tracing filter when neither `RUST_LOG` nor `--log-level` is set.
pub const DEFAULT_LOG_FILTER: &str = "info";
