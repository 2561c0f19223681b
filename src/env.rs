//! Environment virtualization
//!
//! A process launched in the cache sees the cache-side copies of the
//! dependency root, build cache and working directory under their usual
//! variable names. Everything else is inherited as is.

use crate::cache::CacheLayout;
use crate::config::CacheRecord;
use std::ffi::{OsStr, OsString};

/// Dependency root variable
pub const GOPATH: &str = "GOPATH";
/// Build cache variable
pub const GOCACHE: &str = "GOCACHE";
/// Working directory variable
pub const PWD: &str = "PWD";

/// Cache-side values for the rewritten variables, in append order
pub fn replacements(record: &CacheRecord, layout: &CacheLayout) -> Vec<(OsString, OsString)> {
    [
        (GOPATH, &record.gopath),
        (GOCACHE, &record.gocache),
        (PWD, &record.pkgdir),
    ]
    .into_iter()
    .map(|(key, path)| (OsString::from(key), layout.mirror_path(path).into_os_string()))
    .collect()
}

/// Rewrite `base` for a process running in the cache.
///
/// Entries named like a rewritten variable are dropped and the cache-side
/// values appended; all other entries keep their order and value.
pub fn virtualize<I, K, V>(base: I, record: &CacheRecord, layout: &CacheLayout) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let replaced = replacements(record, layout);
    let mut env: Vec<(OsString, OsString)> = base
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .filter(|(key, _)| !is_rewritten(key))
        .collect();
    env.extend(replaced);
    env
}

fn is_rewritten(key: &OsStr) -> bool {
    key == GOPATH || key == GOCACHE || key == PWD
}
