use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::{IoResultExt, Result};

/// create a directory and any missing parents; existing directories are fine
pub fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_path(path)
}

/// replace a file's contents atomically
///
/// temp file in the same directory -> fsync -> rename -> fsync parent.
/// readers see either the old contents or the new ones, never a partial write.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_path(parent)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let written = (|| {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(contents).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
        fs::rename(&tmp_path, path).with_path(path)
    })();

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
        return written;
    }

    fsync_dir(parent)
}

/// sync a directory to disk
pub fn fsync_dir(path: &Path) -> Result<()> {
    let dir = File::open(path).with_path(path)?;
    dir.sync_all().with_path(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_directory_nested_and_existing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a/b/c");

        create_directory(&target).unwrap();
        assert!(target.is_dir());

        // second call is a no-op
        create_directory(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_atomic_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");

        atomic_write(&path, b"first\n").unwrap();
        atomic_write(&path, b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");

        // no temp files left behind
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state/deep/record");

        atomic_write(&path, b"x").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"x");
    }
}
