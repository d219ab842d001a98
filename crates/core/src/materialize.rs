//! Idempotent filesystem materialization.
//!
//! The contract for a materialized reference is that subsequent reads through
//! it observe the current content of the target path, and that re-running the
//! same materialization replaces stale references instead of erroring.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

#[cfg(unix)]
use std::os::unix::fs::symlink;
#[cfg(windows)]
use std::os::windows::fs::symlink_dir as symlink;

/// Create the directory (and all parents) if it does not exist yet.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| Error::io("create directory", path, e))
}

/// Recreate the directory from scratch, discarding any previous contents.
pub fn recreate_dir(path: &Path) -> Result<()> {
    if path.symlink_metadata().is_ok() {
        remove_any(path)?;
    }
    fs::create_dir_all(path).map_err(|e| Error::io("create directory", path, e))
}

/// Materialize a reference at `link` pointing at `target`.
///
/// An existing file, directory, or stale link at `link` is replaced. Parent
/// directories are created as needed.
pub fn replace_link(link: &Path, target: &Path) -> Result<()> {
    if link.symlink_metadata().is_ok() {
        remove_any(link)?;
    }
    if let Some(parent) = link.parent() {
        ensure_dir(parent)?;
    }
    debug!("link {} -> {}", link.display(), target.display());
    symlink(target, link).map_err(|e| Error::io("create symlink", link, e))
}

/// Remove whatever sits at `path`: file, symlink, or directory tree.
fn remove_any(path: &Path) -> Result<()> {
    let meta = path
        .symlink_metadata()
        .map_err(|e| Error::io("stat", path, e))?;
    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(|e| Error::io("remove directory", path, e))
    } else {
        fs::remove_file(path).map_err(|e| Error::io("remove file", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn recreate_dir_discards_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale"), "x").unwrap();

        recreate_dir(&dir).unwrap();

        assert!(dir.exists());
        assert!(!dir.join("stale").exists());
    }

    #[test]
    fn replace_link_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        fs::create_dir_all(&target).unwrap();

        let link = tmp.path().join("a/b/link");
        replace_link(&link, &target).unwrap();

        assert!(link.symlink_metadata().unwrap().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), target);
    }

    #[test]
    fn replace_link_replaces_stale_link() {
        let tmp = TempDir::new().unwrap();
        let old = tmp.path().join("old");
        let new = tmp.path().join("new");
        fs::create_dir_all(&old).unwrap();
        fs::create_dir_all(&new).unwrap();

        let link = tmp.path().join("link");
        replace_link(&link, &old).unwrap();
        replace_link(&link, &new).unwrap();

        assert_eq!(fs::read_link(&link).unwrap(), new);
    }

    #[test]
    fn replace_link_replaces_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        fs::create_dir_all(&target).unwrap();

        let link = tmp.path().join("link");
        fs::create_dir_all(&link).unwrap();
        fs::write(link.join("file"), "x").unwrap();

        replace_link(&link, &target).unwrap();
        assert!(link.symlink_metadata().unwrap().is_symlink());
    }
}
