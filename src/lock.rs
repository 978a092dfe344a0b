//! Per-set file locking across ipsetctl processes.
//!
//! Refreshing a set goes through the shared `<name>-temp` scratch set, so two
//! processes refreshing the same set at once would load into and swap each
//! other's scratch set. An flock-style advisory lock on
//! `<lock-dir>/<name>.lock` keeps them apart.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOCK_DIR: &str = "/run/ipsetctl";

/// Holds the exclusive lock for one set name until dropped.
#[derive(Debug)]
pub struct SetLock {
    _file: File,
    path: PathBuf,
}

impl SetLock {
    /// Attempt to acquire the lock for `set_name` without blocking.
    ///
    /// Returns an error if another process already holds it.
    pub fn acquire(lock_dir: &Path, set_name: &str) -> Result<Self> {
        fs::create_dir_all(lock_dir)
            .with_context(|| format!("Failed to create lock directory: {:?}", lock_dir))?;

        let path = lock_dir.join(format!("{}.lock", set_name));

        // Open without truncating: create and lock must not race
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {:?}", path))?;

        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .context("Failed to set lock file permissions")?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "Another ipsetctl process is already refreshing set '{}'.\n\
                 If you believe this is an error, remove the lock file: {:?}",
                set_name,
                path
            )
        })?;

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// Lock is released when the file is closed (on drop)

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_exclusive_per_set() {
        let dir = tempfile::tempdir().unwrap();

        let first = SetLock::acquire(dir.path(), "blocklist").unwrap();
        assert_eq!(first.path(), dir.path().join("blocklist.lock"));

        let err = SetLock::acquire(dir.path(), "blocklist").unwrap_err();
        assert!(err.to_string().contains("already refreshing set 'blocklist'"));

        // Other set names are independent
        let other = SetLock::acquire(dir.path(), "allowlist");
        assert!(other.is_ok());

        drop(first);
        assert!(SetLock::acquire(dir.path(), "blocklist").is_ok());
    }

    #[test]
    fn test_lock_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("run").join("ipsetctl");
        let lock = SetLock::acquire(&nested, "blocklist").unwrap();
        assert!(nested.is_dir());
        let mode = fs::metadata(lock.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
