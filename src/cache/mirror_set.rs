//! Selection of the directories to mirror
//!
//! The dependency enumerator lists every package directory. Most of them sit
//! below a module root that is listed too, so after sorting, a single pass
//! keeps only directories that are not inside the last accepted one.

use std::fs;
use std::path::{Path, PathBuf};

/// Ordered set of directory trees to mirror for one initialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorSet {
    dirs: Vec<PathBuf>,
}

impl MirrorSet {
    /// Build the set from enumerated directories.
    ///
    /// Directories inside any of `excluded` roots are dropped. Empty roots in
    /// `excluded` are ignored, since every path starts with the empty path.
    pub fn new<I>(listed: I, excluded: &[&Path]) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let excluded: Vec<&Path> = excluded
            .iter()
            .copied()
            .filter(|root| !root.as_os_str().is_empty())
            .collect();

        let mut candidates: Vec<PathBuf> = listed
            .into_iter()
            .filter(|dir| !excluded.iter().any(|root| dir.starts_with(root)))
            .collect();
        candidates.sort();
        candidates.dedup();

        let mut dirs: Vec<PathBuf> = Vec::with_capacity(candidates.len());
        for dir in candidates {
            if let Some(last) = dirs.last() {
                if dir.starts_with(last) {
                    continue;
                }
            }
            dirs.push(dir);
        }

        Self { dirs }
    }

    /// Like `new`, but a directory is also excluded when its symlink-resolved
    /// form lies inside the resolved form of an excluded root. The toolchain
    /// may print a workspace reached through a symlink under either spelling.
    pub fn resolved<I>(listed: I, excluded: &[&Path]) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let roots: Vec<PathBuf> = excluded
            .iter()
            .filter(|root| !root.as_os_str().is_empty())
            .flat_map(|root| spellings(root))
            .collect();

        let kept: Vec<PathBuf> = listed
            .into_iter()
            .filter(|dir| {
                !spellings(dir)
                    .iter()
                    .any(|spelling| roots.iter().any(|root| spelling.starts_with(root)))
            })
            .collect();

        Self::new(kept, &[])
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

/// The path as given plus its canonical form, when that differs
fn spellings(path: &Path) -> Vec<PathBuf> {
    let mut forms = vec![path.to_path_buf()];
    if let Ok(canonical) = fs::canonicalize(path) {
        if canonical != path {
            forms.push(canonical);
        }
    }
    forms
}
