//! tgo - transparent Go build cache
//!
//! CLI entry point that dispatches to the go tool inside the cache.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use std::sync::Arc;
use tgo::cli::{Action, Cli};
use tgo::error::TgoResult;
use tgo::toolchain::GoToolchain;
use tgo::WorkspaceCache;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(code) = e.exit_code() {
                // The child already reported its failure
                debug!("{}", e);
                return ExitCode::from(u8::try_from(code).unwrap_or(1));
            }
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> TgoResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("tgo=warn"),
        1 => EnvFilter::new("tgo=info"),
        _ => EnvFilter::new("tgo=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let workspace = match cli.workspace {
        Some(path) => path,
        None => tgo::workspace::current_dir()?,
    };
    debug!("Workspace: {}", workspace.display());

    let cache = WorkspaceCache::new(&workspace, Arc::new(GoToolchain::new()))?;
    tgo::cli::execute(Action::plan(&cli.args), &cache).await
}
