//! Mirrored build cache
//!
//! Copies a workspace's dependency source trees into a private cache root
//! that mirrors absolute host paths.
//!
//! # Layout
//!
//! | Path | Content |
//! |------|---------|
//! | `<workspace>/.tgo/config.toml` | cache record, written last |
//! | `<workspace>/.tgo/root/<abs path>` | mirrored host directories |
//! | `<workspace>/.tgo/root/<workspace>` | relative symlink to the workspace |
//!
//! Mirrored entries keep their source mode plus owner-write, so a cache built
//! from read-only module trees can still be refreshed and deleted.

pub mod layout;
pub mod mirror;
pub mod mirror_set;
pub mod teardown;

pub use layout::{is_excluded_name, relative_path, CacheLayout, CACHE_MARKER, VCS_DIR};
pub use mirror::{force_owner_write, MirrorEngine, MirrorStats, ModeTransform};
pub use mirror_set::MirrorSet;
pub use teardown::{force_remove, restore_write, OWNER_WRITE};
