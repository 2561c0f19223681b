//! Cache directory layout
//!
//! The cache lives at `<workspace>/.tgo`. Its `root/` directory mirrors
//! absolute host paths: host path `/a/b` lives at `<workspace>/.tgo/root/a/b`.

use crate::config::CacheRecord;
use crate::error::{TgoError, TgoResult};
use std::ffi::OsStr;
use std::fs::{self, DirBuilder};
use std::io::ErrorKind;
use std::os::unix::fs::{symlink, DirBuilderExt};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Name of the cache directory inside the workspace
pub const CACHE_MARKER: &str = ".tgo";

/// Version control metadata directory, never mirrored
pub const VCS_DIR: &str = ".git";

/// Mode for skeleton directories whose host counterpart does not exist
const DEFAULT_DIR_MODE: u32 = 0o750;

/// Whether a path component is excluded from mirroring
pub fn is_excluded_name(name: &OsStr) -> bool {
    name == CACHE_MARKER || name == VCS_DIR
}

/// Paths of one workspace's cache
#[derive(Debug, Clone)]
pub struct CacheLayout {
    workspace: PathBuf,
    cache_dir: PathBuf,
    cache_root: PathBuf,
}

impl CacheLayout {
    /// Layout for the cache of `workspace` (an absolute path)
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        let cache_dir = workspace.join(CACHE_MARKER);
        let cache_root = cache_dir.join("root");
        Self {
            workspace,
            cache_dir,
            cache_root,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// The `.tgo` directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The `.tgo/root` directory mirroring host paths
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Cache-side path mirroring the absolute host path `path`
    pub fn mirror_path(&self, path: &Path) -> PathBuf {
        let relative: PathBuf = path
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect();
        self.cache_root.join(relative)
    }

    /// Create the cache-side skeleton for the workspace parent and the
    /// toolchain directories, copying the host directories' modes.
    pub fn ensure_skeleton(&self, record: &CacheRecord) -> TgoResult<()> {
        let dirs = [
            record.pkgdir.parent(),
            Some(record.gopath.as_path()),
            Some(record.gocache.as_path()),
        ];

        for dir in dirs.into_iter().flatten() {
            if dir.as_os_str().is_empty() {
                continue;
            }
            let mirrored = self.mirror_path(dir);
            DirBuilder::new()
                .recursive(true)
                .mode(DEFAULT_DIR_MODE)
                .create(&mirrored)
                .map_err(|e| TgoError::io(format!("creating {}", mirrored.display()), e))?;

            match fs::metadata(dir) {
                Ok(meta) => {
                    fs::set_permissions(&mirrored, meta.permissions()).map_err(|e| {
                        TgoError::io(format!("copying mode of {}", dir.display()), e)
                    })?;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("{} does not exist on the host, keeping default mode", dir.display());
                }
                Err(e) => return Err(TgoError::io(format!("reading {}", dir.display()), e)),
            }
        }

        Ok(())
    }

    /// Create the symlink from the cache-side workspace path back to the
    /// real workspace. An existing entry at that path is left untouched.
    pub fn ensure_root_link(&self, record: &CacheRecord) -> TgoResult<()> {
        let link = self.mirror_path(&record.pkgdir);
        if fs::symlink_metadata(&link).is_ok() {
            debug!("Root link {} already present", link.display());
            return Ok(());
        }

        let link_dir = link
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.cache_root.clone());
        fs::create_dir_all(&link_dir)
            .map_err(|e| TgoError::io(format!("creating {}", link_dir.display()), e))?;

        let target = relative_path(&link_dir, &record.pkgdir);
        debug!("Linking {} -> {}", link.display(), target.display());
        symlink(&target, &link)
            .map_err(|e| TgoError::io(format!("creating symlink {}", link.display()), e))
    }
}

/// Path of `to` relative to the directory `from`; both must be absolute
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}
