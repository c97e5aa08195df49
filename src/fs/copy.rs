use std::fs::{self, Permissions};
use std::os::unix::fs::{symlink, MetadataExt, PermissionsExt};
use std::path::Path;

use nix::sys::stat::utimes;
use nix::sys::time::TimeVal;
use walkdir::WalkDir;

use crate::error::{walk_error, Error, IoResultExt, Result};

/// copy a file, keeping permission bits and access/modification times
///
/// a symlinked source is followed; the jail gets the content it points at.
/// an existing destination file is overwritten.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst).with_path(src)?;

    let meta = fs::metadata(src).with_path(src)?;
    preserve_times(dst, &meta)
}

/// copy a directory tree into `dst`, merging with whatever is already there
///
/// symlinks inside the tree are recreated as symlinks. directories keep their
/// permission bits and times, like files do.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    if !fs::metadata(src).with_path(src)?.is_dir() {
        return Err(Error::Io {
            path: src.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    // directory metadata is applied last so read-only sources can still be filled
    // and filling a directory does not bump its restored mtime
    let mut dirs = Vec::new();

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| walk_error(src, e))?;

        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).with_path(&target)?;
            let meta = fs::metadata(entry.path()).with_path(entry.path())?;
            dirs.push((target, meta));
        } else if file_type.is_symlink() {
            let link_target = fs::read_link(entry.path()).with_path(entry.path())?;
            if target.symlink_metadata().is_ok() {
                fs::remove_file(&target).with_path(&target)?;
            }
            symlink(&link_target, &target).with_path(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }

    for (dir, meta) in dirs.into_iter().rev() {
        fs::set_permissions(&dir, Permissions::from_mode(meta.mode() & 0o7777))
            .with_path(&dir)?;
        preserve_times(&dir, &meta)?;
    }

    Ok(())
}

fn preserve_times(dst: &Path, meta: &fs::Metadata) -> Result<()> {
    let atime = TimeVal::new(meta.atime() as _, (meta.atime_nsec() / 1000) as _);
    let mtime = TimeVal::new(meta.mtime() as _, (meta.mtime_nsec() / 1000) as _);

    utimes(dst, &atime, &mtime).map_err(|errno| Error::Io {
        path: dst.to_path_buf(),
        source: std::io::Error::from(errno),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    #[test]
    fn test_copy_file_preserves_mode_and_mtime() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("tool");
        let dst = dir.path().join("copy");
        fs::write(&src, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&src, Permissions::from_mode(0o750)).unwrap();

        let old = SystemTime::now() - Duration::from_secs(86_400);
        let file = fs::File::options().write(true).open(&src).unwrap();
        file.set_modified(old).unwrap();
        drop(file);

        copy_file(&src, &dst).unwrap();

        let src_meta = fs::metadata(&src).unwrap();
        let dst_meta = fs::metadata(&dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"#!/bin/sh\n");
        assert_eq!(dst_meta.mode() & 0o777, 0o750);
        assert_eq!(dst_meta.mtime(), src_meta.mtime());
    }

    #[test]
    fn test_copy_file_follows_symlink() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("libc.so.6.real");
        let link = dir.path().join("libc.so.6");
        fs::write(&real, "elf").unwrap();
        symlink(&real, &link).unwrap();

        let dst = dir.path().join("out");
        copy_file(&link, &dst).unwrap();

        assert!(!dst.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&dst).unwrap(), b"elf");
    }

    #[test]
    fn test_copy_dir_recursive() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("terminfo");
        fs::create_dir_all(src.join("x")).unwrap();
        fs::write(src.join("x/xterm"), "caps").unwrap();
        symlink("x/xterm", src.join("default")).unwrap();

        let dst = dir.path().join("jail/usr/share/terminfo");
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        copy_dir_recursive(&src, &dst).unwrap();

        assert!(dst.join("x").is_dir());
        assert_eq!(fs::read_to_string(dst.join("x/xterm")).unwrap(), "caps");
        let link_meta = dst.join("default").symlink_metadata().unwrap();
        assert!(link_meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(dst.join("default")).unwrap(),
            Path::new("x/xterm")
        );
    }

    #[test]
    fn test_copy_dir_recursive_preserves_dir_times() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("share");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("sub/item"), "item").unwrap();

        let old = TimeVal::new(1_000_000_000, 0);
        utimes(&src.join("sub"), &old, &old).unwrap();
        utimes(&src, &old, &old).unwrap();

        let dst = dir.path().join("copy");
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::metadata(&dst).unwrap().mtime(), 1_000_000_000);
        assert_eq!(fs::metadata(dst.join("sub")).unwrap().mtime(), 1_000_000_000);
        assert_eq!(fs::read_to_string(dst.join("sub/item")).unwrap(), "item");
    }

    #[test]
    fn test_copy_dir_recursive_merges() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a"), "new").unwrap();
        symlink("a", src.join("l")).unwrap();

        let dst = dir.path().join("dst");
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("a"), "old").unwrap();
        fs::write(dst.join("keep"), "kept").unwrap();

        copy_dir_recursive(&src, &dst).unwrap();
        // running again replaces the symlink instead of failing
        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dst.join("keep")).unwrap(), "kept");
        assert!(dst.join("l").symlink_metadata().is_ok());
    }

    #[test]
    fn test_copy_dir_rejects_file_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("plain");
        fs::write(&src, "x").unwrap();

        let result = copy_dir_recursive(&src, &dir.path().join("dst"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let dir = tempdir().unwrap();
        let result = copy_file(&dir.path().join("absent"), &dir.path().join("dst"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
