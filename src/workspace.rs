//! Mirrored build cache of one workspace
//!
//! `WorkspaceCache` owns everything about one workspace's cache: its layout,
//! its persisted record, the toolchain used to enumerate dependencies and the
//! guard making initialization happen once per process.

use crate::cache::{force_remove, CacheLayout, MirrorEngine, MirrorSet};
use crate::config::{CacheRecord, ConfigStore};
use crate::env::virtualize;
use crate::error::{TgoError, TgoResult};
use crate::lifecycle::{LifecycleGuard, LifecycleState};
use crate::process::ProcessRunner;
use crate::toolchain::Toolchain;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Cache of one workspace
pub struct WorkspaceCache {
    layout: CacheLayout,
    store: ConfigStore,
    toolchain: Arc<dyn Toolchain>,
    guard: LifecycleGuard<CacheRecord>,
}

impl WorkspaceCache {
    /// Cache for `workspace`; relative paths are resolved against the
    /// current directory
    pub fn new(workspace: impl AsRef<Path>, toolchain: Arc<dyn Toolchain>) -> TgoResult<Self> {
        let absolute = std::path::absolute(workspace.as_ref()).map_err(|e| {
            TgoError::io(
                format!("resolving workspace {}", workspace.as_ref().display()),
                e,
            )
        })?;
        let layout = CacheLayout::new(normalize(&absolute));
        let store = ConfigStore::new(layout.cache_dir());
        Ok(Self {
            layout,
            store,
            toolchain,
            guard: LifecycleGuard::new(),
        })
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn state(&self) -> LifecycleState {
        self.guard.state()
    }

    /// Initialize the cache once per process and return its record
    pub async fn init(&self) -> TgoResult<&CacheRecord> {
        self.guard.get_or_init(|| self.initialize()).await
    }

    /// Config load, dependency enumeration, mirroring, config persist
    async fn initialize(&self) -> TgoResult<CacheRecord> {
        let workspace = self.layout.workspace().to_path_buf();
        let toolchain_env = self.toolchain.env(&workspace).await?;

        let (record, fresh) = match self.store.load().await? {
            Some(record) => (record, false),
            None => {
                let record = CacheRecord {
                    pkgdir: workspace.clone(),
                    gopath: toolchain_env.dep_root.clone(),
                    gocache: toolchain_env.build_cache.clone(),
                };
                (record, true)
            }
        };

        if fresh {
            info!("Creating cache in {}", self.layout.cache_dir().display());
            let layout = self.layout.clone();
            let skeleton_record = record.clone();
            blocking(move || {
                layout.ensure_skeleton(&skeleton_record)?;
                layout.ensure_root_link(&skeleton_record)
            })
            .await?;
        }

        if record.pkgdir == workspace {
            let listed = self.toolchain.list_dirs(&workspace).await?;
            debug!("{} listed {} directories", self.toolchain.name(), listed.len());
            let set = MirrorSet::resolved(
                listed,
                &[
                    toolchain_env.root.as_path(),
                    toolchain_env.dep_root.as_path(),
                    toolchain_env.mod_cache.as_path(),
                    workspace.as_path(),
                ],
            );
            let engine = MirrorEngine::new(self.layout.clone());
            blocking(move || engine.mirror(&set)).await?;
        } else {
            info!(
                "Cache was created for {}, not refreshing dependencies from {}",
                record.pkgdir.display(),
                workspace.display()
            );
        }

        if fresh {
            self.store.persist(&record).await?;
        }
        Ok(record)
    }

    /// The current process environment, virtualized for the cache
    pub async fn env(&self) -> TgoResult<Vec<(OsString, OsString)>> {
        let record = self.init().await?;
        Ok(virtualize(std::env::vars_os(), record, &self.layout))
    }

    /// A runner launching children inside the cache
    pub async fn runner(&self) -> TgoResult<ProcessRunner> {
        let env = self.env().await?;
        let record = self.init().await?;
        let dir = self.layout.mirror_path(&record.pkgdir);
        Ok(ProcessRunner::new(env).current_dir(dir))
    }

    /// Run a shell-style command line in the cache
    pub async fn run(&self, command_line: &str) -> TgoResult<()> {
        self.runner().await?.run(command_line).await
    }

    /// Run `program` with explicit arguments in the cache
    pub async fn run_args<S: AsRef<OsStr>>(&self, program: &str, args: &[S]) -> TgoResult<()> {
        self.runner().await?.run_args(program, args).await
    }

    /// Remove `target`, which must lie inside the cache directory
    pub async fn remove(&self, target: impl Into<PathBuf>) -> TgoResult<()> {
        let target = target.into();
        let scope = self.layout.cache_dir().to_path_buf();
        blocking(move || force_remove(&target, &scope)).await
    }

    /// Remove the whole cache directory
    pub async fn clean(&self) -> TgoResult<()> {
        self.init().await?;
        info!("Removing {}", self.layout.cache_dir().display());
        self.remove(self.layout.cache_dir()).await
    }
}

/// The current directory as the shell spells it.
///
/// `$PWD` is used when it names the same directory as the process's working
/// directory, so a workspace entered through a symlink keeps that path.
pub fn current_dir() -> TgoResult<PathBuf> {
    let physical =
        std::env::current_dir().map_err(|e| TgoError::io("getting current directory", e))?;
    Ok(logical_dir(physical, std::env::var_os("PWD")))
}

fn logical_dir(physical: PathBuf, pwd: Option<OsString>) -> PathBuf {
    let Some(pwd) = pwd.map(PathBuf::from) else {
        return physical;
    };
    if !pwd.is_absolute() {
        return physical;
    }
    match (fs::metadata(&pwd), fs::metadata(&physical)) {
        (Ok(logical), Ok(real)) if logical.dev() == real.dev() && logical.ino() == real.ino() => {
            pwd
        }
        _ => physical,
    }
}

/// Fold `.` and `..` components without touching the filesystem, keeping
/// symlinked paths as the user wrote them
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Run blocking filesystem work off the async runtime
async fn blocking<F, T>(work: F) -> TgoResult<T>
where
    F: FnOnce() -> TgoResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| TgoError::Internal(format!("blocking task failed: {}", e)))?
}
