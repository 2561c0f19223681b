//! Cache record schema
//!
//! The record is stored at `<workspace>/.tgo/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted description of a mirrored workspace
///
/// Every key is required; a record missing one is rejected on load rather
/// than filled with defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheRecord {
    /// Workspace root the cache was created for
    pub pkgdir: PathBuf,

    /// Dependency root (GOPATH) at creation time
    pub gopath: PathBuf,

    /// Build cache (GOCACHE) at creation time
    pub gocache: PathBuf,
}
