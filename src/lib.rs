//! tgo - transparent Go build cache
//!
//! Mirrors a workspace's dependency source trees into `<workspace>/.tgo` and
//! runs the go tool there with a rewritten environment, so builds do not
//! depend on host paths, mount restrictions or file ownership.

pub mod cache;
pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod lifecycle;
pub mod process;
pub mod toolchain;
pub mod workspace;

pub use error::{TgoError, TgoResult};
pub use workspace::WorkspaceCache;
