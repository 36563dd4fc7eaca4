use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;

use ddg_task::consts::{DEFAULT_MODEL, DEFAULT_TIMEOUT};
use ddg_task::engine::Engine;
use ddg_task::engine::runner::TaskRunner;
use ddg_task::logging;
use ddg_task::operators::{Operator, OperatorRegistry};
use ddg_task::provider::duckduckgo::{DuckDuckGoChat, ProviderConfig};
use ddg_task::task::TaskInput;

#[derive(Parser)]
#[command(
    name = "ddg-task",
    version,
    about = "Run one operator task against the DuckDuckGo chat assistant."
)]
struct Cli {
    /// Task config as JSON: {"operator": "...", "kwargs": {...}}. Use `-` to read stdin.
    #[arg(
        required_unless_present_any = ["file", "list_operators"],
        conflicts_with = "file"
    )]
    config: Option<String>,

    /// Read the task config from a JSON file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Default chat model alias (gpt-4o-mini, llama-3.3-70b, claude-3-haiku, o3-mini, mixtral-8x7b)
    #[arg(short, long, env = "DDG_TASK_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat request timeout in seconds
    #[arg(short, long, env = "DDG_TASK_TIMEOUT", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Log filter directive, e.g. `debug` or `ddg_task=debug` (overrides RUST_LOG)
    #[arg(long, env = "DDG_TASK_LOG")]
    log_level: Option<String>,

    /// List the available operators and exit
    #[arg(long, default_value_t = false)]
    list_operators: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_level.as_deref())?;

    if cli.list_operators {
        for op in Operator::descriptions() {
            println!("{:<12} {}", op.name, op.description);
        }
        return Ok(());
    }

    // One provider client for the whole process
    let provider = DuckDuckGoChat::new(ProviderConfig {
        model: cli.model,
        timeout: Duration::from_secs(cli.timeout),
        ..ProviderConfig::default()
    })?;
    let runner = TaskRunner::new(OperatorRegistry::new(Arc::new(provider)));

    let raw = match (cli.config, cli.file) {
        (Some(config), _) if config == "-" => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read task config from stdin")?;
            buf
        }
        (Some(config), _) => config,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read task config from {}", path.display()))?,
        (None, None) => anyhow::bail!("no task config given"),
    };

    let result = runner.run(TaskInput::Raw(raw)).await?;
    println!("{}", result);
    Ok(())
}
