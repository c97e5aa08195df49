use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{IoResultExt, Result};

/// remove a file (or symlink); returns false when it was already gone
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_path(path),
    }
}

/// remove a directory tree; returns false when it was already gone
pub fn remove_dir_all_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_path(path),
    }
}
