//! Toolchain boundary
//!
//! The cache only needs two things from the build toolchain: where its own
//! directories live, and which directories contribute source to a workspace.

mod go;

pub use go::{parse_dir_list, parse_go_env, GoToolchain};

use crate::error::TgoResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Toolchain directories relevant to mirroring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainEnv {
    /// System install root (GOROOT)
    pub root: PathBuf,
    /// Dependency root (first GOPATH entry)
    pub dep_root: PathBuf,
    /// Module download cache (GOMODCACHE)
    pub mod_cache: PathBuf,
    /// Build cache (GOCACHE)
    pub build_cache: PathBuf,
}

/// Abstract toolchain interface
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Query the toolchain's directories as seen from `workspace`
    async fn env(&self, workspace: &Path) -> TgoResult<ToolchainEnv>;

    /// List every directory contributing source to `workspace`, one absolute
    /// path per entry, in no particular order
    async fn list_dirs(&self, workspace: &Path) -> TgoResult<Vec<PathBuf>>;

    /// Get the human-readable toolchain name for display
    fn name(&self) -> &'static str;
}
