//! the managed-object record: one path per line, consulted on the next run

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nix::fcntl::{Flock, FlockArg};

use crate::error::{Error, IoResultExt, Result};
use crate::fs::{atomic_write, remove_file_if_exists};

/// paths copied into the jail by the last successful run
///
/// a missing record means nothing is managed yet. blank lines are ignored.
pub fn load(manifest_path: &Path) -> Result<BTreeSet<String>> {
    let content = match fs::read_to_string(manifest_path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e).with_path(manifest_path),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// overwrite the record with one path per line, skipping blank entries
pub fn save<'a, I>(manifest_path: &Path, paths: I) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut content = String::new();
    for path in paths {
        if path.trim().is_empty() {
            continue;
        }
        content.push_str(path);
        content.push('\n');
    }

    atomic_write(manifest_path, content.as_bytes())
}

/// path of the advisory lock guarding a manifest
pub fn lock_path(manifest_path: &Path) -> PathBuf {
    let mut name = manifest_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    manifest_path.with_file_name(name)
}

/// guard that holds the manifest lock until dropped
pub struct ManifestLock {
    #[allow(dead_code)]
    flock: Flock<File>,
    path: PathBuf,
}
// lock is released automatically when Flock is dropped

impl ManifestLock {
    /// acquire an exclusive lock on the manifest, failing if another run holds it
    pub fn acquire(manifest_path: &Path) -> Result<Self> {
        match Self::try_acquire(manifest_path)? {
            Some(lock) => Ok(lock),
            None => Err(Error::LockContention(manifest_path.to_path_buf())),
        }
    }

    /// try to acquire the lock, returning None if already held
    pub fn try_acquire(manifest_path: &Path) -> Result<Option<Self>> {
        let lock_path = lock_path(manifest_path);
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_path(parent)?;
            }
        }
        Self::lock(lock_path)
    }

    /// lock for a run that removes the manifest
    ///
    /// never creates the manifest's directory. returns None when that
    /// directory does not exist, since no other run can be holding a lock
    /// inside it.
    pub fn acquire_for_removal(manifest_path: &Path) -> Result<Option<Self>> {
        let lock_path = lock_path(manifest_path);
        let parent_missing = match lock_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => !parent.is_dir(),
            _ => false,
        };
        if parent_missing {
            return Ok(None);
        }

        match Self::lock(lock_path)? {
            Some(lock) => Ok(Some(lock)),
            None => Err(Error::LockContention(manifest_path.to_path_buf())),
        }
    }

    /// delete the lock file, then release the lock
    ///
    /// the file is unlinked while still locked, so a concurrent run either
    /// sees the held lock or creates a fresh file.
    pub fn remove(self) -> Result<()> {
        remove_file_if_exists(&self.path)?;
        Ok(())
    }

    fn lock(lock_path: PathBuf) -> Result<Option<Self>> {
        let file = File::create(&lock_path).with_path(&lock_path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => Ok(Some(Self {
                flock,
                path: lock_path,
            })),
            Err((_, nix::errno::Errno::EWOULDBLOCK)) => Ok(None),
            Err((_, errno)) => Err(Error::Io {
                path: lock_path,
                source: std::io::Error::from(errno),
            }),
        }
    }
}
