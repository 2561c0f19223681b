//! Forced removal of mirrored trees
//!
//! Mirrored sources may be read-only (module caches usually are), so every
//! entry gets its owner-write bit back before the tree is deleted.

use crate::error::{TgoError, TgoResult};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;

/// Owner write permission bit
pub const OWNER_WRITE: u32 = 0o200;

/// Add owner-write to every entry under `path`. Symlinks are not followed
/// and keep their (meaningless) mode.
pub fn restore_write(path: &Path) -> TgoResult<()> {
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.map_err(|e| {
            let context = format!(
                "walking {}",
                e.path().unwrap_or(path).display()
            );
            TgoError::io(context, e.into())
        })?;
        if entry.path_is_symlink() {
            continue;
        }
        let meta = entry
            .metadata()
            .map_err(|e| TgoError::io(format!("reading {}", entry.path().display()), e.into()))?;
        let mode = meta.permissions().mode();
        if mode & OWNER_WRITE == 0 {
            fs::set_permissions(entry.path(), fs::Permissions::from_mode(mode | OWNER_WRITE))
                .map_err(|e| {
                    TgoError::io(format!("making {} writable", entry.path().display()), e)
                })?;
        }
    }
    Ok(())
}

/// Remove `target` after restoring write permission on its contents.
///
/// `target` must be `scope` itself or lie below it; anything else is refused
/// before touching the filesystem. A missing target is not an error.
pub fn force_remove(target: &Path, scope: &Path) -> TgoResult<()> {
    let escapes = target
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::CurDir));
    if escapes || !target.is_absolute() || !target.starts_with(scope) {
        return Err(TgoError::ScopeViolation {
            target: target.to_path_buf(),
            scope: scope.to_path_buf(),
        });
    }

    match fs::symlink_metadata(target) {
        Ok(meta) if meta.file_type().is_symlink() || !meta.is_dir() => {
            return fs::remove_file(target)
                .map_err(|e| TgoError::io(format!("removing {}", target.display()), e));
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Nothing to remove at {}", target.display());
            return Ok(());
        }
        Err(e) => return Err(TgoError::io(format!("reading {}", target.display()), e)),
    }

    restore_write(target)?;
    fs::remove_dir_all(target)
        .map_err(|e| TgoError::io(format!("removing {}", target.display()), e))?;
    debug!("Removed {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[test]
    fn removes_read_only_tree() {
        let temp = TempDir::new().unwrap();
        let scope = temp.path().join(".tgo");
        let dir = scope.join("root").join("mod");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.go"), "package a\n").unwrap();
        fs::set_permissions(dir.join("a.go"), fs::Permissions::from_mode(0o444)).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        force_remove(&scope, &scope).unwrap();

        assert!(!scope.exists());
    }

    #[test]
    fn does_not_touch_link_targets() {
        let temp = TempDir::new().unwrap();
        let outside = temp.path().join("outside.txt");
        fs::write(&outside, "keep").unwrap();
        fs::set_permissions(&outside, fs::Permissions::from_mode(0o444)).unwrap();

        let scope = temp.path().join(".tgo");
        fs::create_dir_all(&scope).unwrap();
        symlink(&outside, scope.join("link")).unwrap();

        force_remove(&scope, &scope).unwrap();

        assert!(outside.exists());
        let mode = fs::metadata(&outside).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o444);
    }

    #[test]
    fn refuses_outside_scope() {
        let temp = TempDir::new().unwrap();
        let scope = temp.path().join(".tgo");
        let victim = temp.path().join("src");
        fs::create_dir_all(&scope).unwrap();
        fs::create_dir_all(&victim).unwrap();

        let err = force_remove(&victim, &scope).unwrap_err();
        assert!(matches!(err, TgoError::ScopeViolation { .. }));
        assert!(victim.exists());

        let sneaky = scope.join("..").join("src");
        let err = force_remove(&sneaky, &scope).unwrap_err();
        assert!(matches!(err, TgoError::ScopeViolation { .. }));
        assert!(victim.exists());
    }

    #[test]
    fn missing_target_is_ok() {
        let temp = TempDir::new().unwrap();
        let scope = temp.path().join(".tgo");
        force_remove(&scope, &scope).unwrap();
    }
}
