//! Mirror engine
//!
//! Replicates host directory trees into the cache root, keeping structure,
//! symlink targets and permission bits. Every mirrored entry gets its mode
//! through one transform (by default: source mode plus owner-write) so the
//! cache can always be cleaned later.

use crate::cache::layout::{is_excluded_name, CacheLayout};
use crate::cache::mirror_set::MirrorSet;
use crate::cache::teardown::{force_remove, OWNER_WRITE};
use crate::error::{TgoError, TgoResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::os::unix::fs::{symlink, OpenOptionsExt, PermissionsExt};
use std::path::Path;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Maps a source mode to the mode of its mirrored copy
pub type ModeTransform = fn(u32) -> u32;

/// Default transform: keep the source mode, force owner-write
pub fn force_owner_write(mode: u32) -> u32 {
    mode | OWNER_WRITE
}

/// Counters for one mirror pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub trees: usize,
    pub dirs: usize,
    pub files: usize,
    pub symlinks: usize,
}

impl MirrorStats {
    fn add(&mut self, other: MirrorStats) {
        self.trees += other.trees;
        self.dirs += other.dirs;
        self.files += other.files;
        self.symlinks += other.symlinks;
    }
}

/// Copies directory trees into a cache layout
#[derive(Debug, Clone)]
pub struct MirrorEngine {
    layout: CacheLayout,
    transform: ModeTransform,
}

impl MirrorEngine {
    pub fn new(layout: CacheLayout) -> Self {
        Self::with_transform(layout, force_owner_write)
    }

    pub fn with_transform(layout: CacheLayout, transform: ModeTransform) -> Self {
        Self { layout, transform }
    }

    /// Mirror every tree of the set, in order.
    ///
    /// Any error aborts the pass; trees mirrored so far stay in the cache and
    /// are cleared and rebuilt by the next pass.
    pub fn mirror(&self, set: &MirrorSet) -> TgoResult<MirrorStats> {
        let mut stats = MirrorStats::default();
        for dir in set.dirs() {
            stats.add(self.mirror_tree(dir)?);
        }
        info!(
            "Mirrored {} trees ({} dirs, {} files, {} symlinks)",
            stats.trees, stats.dirs, stats.files, stats.symlinks
        );
        Ok(stats)
    }

    /// Replace the cache-side image of `dir` with a fresh copy
    pub fn mirror_tree(&self, dir: &Path) -> TgoResult<MirrorStats> {
        let dest = self.layout.mirror_path(dir);
        force_remove(&dest, self.layout.cache_root())?;
        debug!("Mirroring {} -> {}", dir.display(), dest.display());

        let mut stats = MirrorStats {
            trees: 1,
            ..MirrorStats::default()
        };
        let walker = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_excluded(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let context = format!("walking {}", e.path().unwrap_or(dir).display());
                TgoError::io(context, e.into())
            })?;
            self.copy_entry(&entry, &mut stats)?;
        }

        Ok(stats)
    }

    fn copy_entry(&self, entry: &DirEntry, stats: &mut MirrorStats) -> TgoResult<()> {
        let src = entry.path();
        let dst = self.layout.mirror_path(src);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            remove_existing(&dst)?;
            let target = fs::read_link(src)
                .map_err(|e| TgoError::io(format!("reading symlink {}", src.display()), e))?;
            symlink(&target, &dst)
                .map_err(|e| TgoError::io(format!("creating symlink {}", dst.display()), e))?;
            // chmod follows symlinks and Linux links carry no mode of their own
            stats.symlinks += 1;
            return Ok(());
        }

        let meta = entry
            .metadata()
            .map_err(|e| TgoError::io(format!("reading {}", src.display()), e.into()))?;
        let mode = (self.transform)(meta.permissions().mode() & 0o7777);

        if file_type.is_dir() {
            fs::create_dir_all(&dst)
                .map_err(|e| TgoError::io(format!("creating {}", dst.display()), e))?;
            set_mode(&dst, mode)?;
            stats.dirs += 1;
        } else if file_type.is_file() {
            copy_file(src, &dst, mode)?;
            stats.files += 1;
        } else {
            debug!("Skipping special file {}", src.display());
        }
        Ok(())
    }
}

fn is_excluded(entry: &DirEntry) -> bool {
    entry
        .path()
        .components()
        .any(|c| is_excluded_name(c.as_os_str()))
}

fn copy_file(src: &Path, dst: &Path, mode: u32) -> TgoResult<()> {
    let mut input =
        File::open(src).map_err(|e| TgoError::io(format!("opening {}", src.display()), e))?;
    remove_existing(dst)?;
    let mut output = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(dst)
        .map_err(|e| TgoError::io(format!("creating {}", dst.display()), e))?;
    io::copy(&mut input, &mut output)
        .map_err(|e| TgoError::io(format!("copying {}", src.display()), e))?;
    // The create mode is filtered through the umask
    set_mode(dst, mode)
}

fn set_mode(path: &Path, mode: u32) -> TgoResult<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| TgoError::io(format!("setting mode of {}", path.display()), e))
}

fn remove_existing(path: &Path) -> TgoResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TgoError::io(format!("removing {}", path.display()), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        base: PathBuf,
        layout: CacheLayout,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let base = temp.path().canonicalize().unwrap();
        let layout = CacheLayout::new(base.join("w"));
        fs::create_dir_all(layout.cache_root()).unwrap();
        Fixture {
            _temp: temp,
            base,
            layout,
        }
    }

    fn mode_of(path: &Path) -> u32 {
        fs::symlink_metadata(path).unwrap().permissions().mode() & 0o7777
    }

    fn sample_tree(base: &Path) -> PathBuf {
        let dep = base.join("dep").join("libfoo");
        fs::create_dir_all(dep.join("sub")).unwrap();
        fs::write(dep.join("a.go"), "package foo\n").unwrap();
        fs::set_permissions(dep.join("a.go"), fs::Permissions::from_mode(0o644)).unwrap();
        fs::write(dep.join("sub").join("ro.go"), "package sub\n").unwrap();
        fs::set_permissions(dep.join("sub").join("ro.go"), fs::Permissions::from_mode(0o444))
            .unwrap();
        fs::write(dep.join("run.sh"), "#!/bin/sh\n").unwrap();
        fs::set_permissions(dep.join("run.sh"), fs::Permissions::from_mode(0o555)).unwrap();
        symlink("a.go", dep.join("link")).unwrap();
        dep
    }

    #[test]
    fn mirror_preserves_structure_links_and_modes() {
        let fx = fixture();
        let dep = sample_tree(&fx.base);
        let engine = MirrorEngine::new(fx.layout.clone());

        let stats = engine.mirror_tree(&dep).unwrap();
        assert_eq!(stats.files, 3);
        assert_eq!(stats.symlinks, 1);
        assert_eq!(stats.dirs, 2);

        let mirrored = fx.layout.mirror_path(&dep);
        assert_eq!(fs::read_to_string(mirrored.join("a.go")).unwrap(), "package foo\n");
        assert_eq!(mode_of(&mirrored.join("a.go")), 0o644);
        assert_eq!(mode_of(&mirrored.join("sub").join("ro.go")), 0o644);
        assert_eq!(mode_of(&mirrored.join("run.sh")), 0o755);
        assert_eq!(mode_of(&mirrored), mode_of(&dep) | OWNER_WRITE);
        assert_eq!(fs::read_link(mirrored.join("link")).unwrap(), PathBuf::from("a.go"));
    }

    #[test]
    fn mirror_is_idempotent() {
        let fx = fixture();
        let dep = sample_tree(&fx.base);
        let engine = MirrorEngine::new(fx.layout.clone());

        let first = engine.mirror_tree(&dep).unwrap();
        let second = engine.mirror_tree(&dep).unwrap();
        assert_eq!(first, second);

        let mirrored = fx.layout.mirror_path(&dep);
        let mut names: Vec<_> = WalkDir::new(&mirrored)
            .into_iter()
            .map(|e| e.unwrap().path().strip_prefix(&mirrored).unwrap().to_path_buf())
            .collect();
        names.sort();
        assert_eq!(names.len(), 6);
        assert_eq!(mode_of(&mirrored.join("sub").join("ro.go")), 0o644);
    }

    #[test]
    fn remirror_removes_stale_files() {
        let fx = fixture();
        let dep = sample_tree(&fx.base);
        let engine = MirrorEngine::new(fx.layout.clone());
        engine.mirror_tree(&dep).unwrap();

        let mirrored = fx.layout.mirror_path(&dep);
        fs::write(mirrored.join("sub").join("stale.go"), "package sub\n").unwrap();
        fs::set_permissions(&mirrored.join("sub"), fs::Permissions::from_mode(0o555)).unwrap();

        engine.mirror_tree(&dep).unwrap();
        assert!(!mirrored.join("sub").join("stale.go").exists());
        assert!(mirrored.join("sub").join("ro.go").exists());
    }

    #[test]
    fn excluded_directories_are_skipped() {
        let fx = fixture();
        let dep = sample_tree(&fx.base);
        fs::create_dir_all(dep.join(".git").join("objects")).unwrap();
        fs::write(dep.join(".git").join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::create_dir_all(dep.join("sub").join(".tgo")).unwrap();

        MirrorEngine::new(fx.layout.clone()).mirror_tree(&dep).unwrap();

        let mirrored = fx.layout.mirror_path(&dep);
        assert!(!mirrored.join(".git").exists());
        assert!(!mirrored.join("sub").join(".tgo").exists());
        assert!(mirrored.join("a.go").exists());
    }

    #[test]
    fn nested_set_member_is_covered_by_parent() {
        let fx = fixture();
        let dep = sample_tree(&fx.base);
        let set = MirrorSet::new(vec![dep.join("sub"), dep.clone()], &[]);

        let stats = MirrorEngine::new(fx.layout.clone()).mirror(&set).unwrap();
        assert_eq!(stats.trees, 1);
        assert!(fx.layout.mirror_path(&dep.join("sub")).join("ro.go").is_file());
    }

    #[test]
    fn vanished_directory_is_an_error() {
        let fx = fixture();
        let missing = fx.base.join("dep").join("gone");

        let err = MirrorEngine::new(fx.layout.clone())
            .mirror_tree(&missing)
            .unwrap_err();
        assert!(matches!(err, TgoError::Io { .. }));
    }

    #[test]
    fn unreadable_file_aborts_mirror() {
        let fx = fixture();
        let src = sample_tree(&fx.base);
        let secret = src.join("secret.go");
        fs::write(&secret, "package foo\n").unwrap();
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop root
        if File::open(&secret).is_ok() {
            fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();
            return;
        }

        let err = MirrorEngine::new(fx.layout.clone())
            .mirror_tree(&src)
            .unwrap_err();
        let expected = secret.display().to_string();
        assert!(
            matches!(err, TgoError::Io { ref context, .. } if context.contains(&expected)),
            "unexpected error: {}",
            err
        );
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn custom_transform_applies_to_every_entry() {
        let fx = fixture();
        let dep = sample_tree(&fx.base);
        let engine = MirrorEngine::with_transform(fx.layout.clone(), |_| 0o700);

        engine.mirror_tree(&dep).unwrap();
        let mirrored = fx.layout.mirror_path(&dep);
        assert_eq!(mode_of(&mirrored.join("a.go")), 0o700);
        assert_eq!(mode_of(&mirrored.join("sub")), 0o700);
    }
}
