//! Command dispatch
//!
//! Maps the command line onto go tool invocations inside the cache.

use crate::error::{TgoError, TgoResult};
use crate::workspace::WorkspaceCache;
use tracing::debug;

/// go subcommands forwarded verbatim
pub const GO_SUBCOMMANDS: &[&str] = &[
    "bug", "build", "doc", "env", "fix", "fmt", "generate", "get", "install", "list", "mod",
    "run", "test", "tool", "version", "vet", "help",
];

/// Build run before launching an arbitrary program
pub const DEFAULT_BUILD: &str = "go build ./...";

/// What a command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `go build ./...`
    Build,
    /// `go <args>`
    Go(Vec<String>),
    /// `go clean <args>`, then remove the cache when no arguments were given
    Clean { args: Vec<String> },
    /// `go build ./...`, then run `program` from PATH
    BuildThenRun { program: String, args: Vec<String> },
}

impl Action {
    /// Decide the action for the positional arguments
    pub fn plan(args: &[String]) -> Self {
        let Some((first, rest)) = args.split_first() else {
            return Self::Build;
        };

        if first == "clean" {
            Self::Clean {
                args: rest.to_vec(),
            }
        } else if GO_SUBCOMMANDS.contains(&first.as_str()) {
            Self::Go(args.to_vec())
        } else {
            Self::BuildThenRun {
                program: first.clone(),
                args: rest.to_vec(),
            }
        }
    }
}

/// Execute an action against a workspace cache
pub async fn execute(action: Action, cache: &WorkspaceCache) -> TgoResult<()> {
    debug!("Dispatching {:?}", action);
    match action {
        Action::Build => cache.run(DEFAULT_BUILD).await,
        Action::Go(args) => cache.run_args("go", &args).await,
        Action::Clean { args } => {
            let mut go_args = vec!["clean".to_string()];
            go_args.extend(args.iter().cloned());
            cache.run_args("go", &go_args).await?;
            if args.is_empty() {
                cache.clean().await?;
            }
            Ok(())
        }
        Action::BuildThenRun { program, args } => {
            cache.run(DEFAULT_BUILD).await?;
            if which::which(&program).is_err() {
                return Err(TgoError::ProgramNotFound(program));
            }
            cache.run_args(&program, &args).await
        }
    }
}
