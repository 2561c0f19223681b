//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// tgo - transparent Go build cache
///
/// Runs the go tool against a mirrored copy of the workspace and its
/// dependencies so builds behave the same in containers and bind mounts.
#[derive(Parser, Debug)]
#[command(name = "tgo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Workspace directory (defaults to current directory)
    #[arg(short = 'C', long, env = "TGO_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// go subcommand, `clean`, or a program to run after building
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
