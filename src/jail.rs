use std::path::{Path, PathBuf};

/// a jail root and the path-resolution rule shared by every planner and executor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jail {
    root: PathBuf,
}

impl Jail {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// jail root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// map a host path into the jail
    ///
    /// strips one leading separator and joins the rest to the jail root.
    /// files and directories resolve identically. `.` and `..` are resolved
    /// first and never climb above the jail root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = normalize(path);
        let rel = path.strip_prefix('/').unwrap_or(path.as_str());
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }
}

/// lexical cleanup of a slash-delimited path
///
/// collapses repeated separators, drops a trailing one and resolves `.` and
/// `..` without touching the filesystem. "/usr//lib/" becomes "/usr/lib",
/// "/opt/app/bin/../lib" becomes "/opt/app/lib". on an absolute path `..`
/// stops at "/"; a relative path keeps its leading `..` segments.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut stack: Vec<&str> = Vec::new();
    for segment in segments(path) {
        match segment {
            "." => {}
            ".." => match stack.last().copied() {
                Some(last) if last != ".." => {
                    stack.pop();
                }
                _ if absolute => {}
                _ => stack.push(segment),
            },
            _ => stack.push(segment),
        }
    }

    let joined = stack.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// does an absolute path climb above "/" through `..` segments
pub fn escapes_root(path: &str) -> bool {
    let mut level = 0usize;
    for segment in segments(path) {
        match segment {
            "." => {}
            ".." => match level.checked_sub(1) {
                Some(up) => level = up,
                None => return true,
            },
            _ => level += 1,
        }
    }
    false
}

/// non-empty components of a slash-delimited path
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// parent directory of an absolute path, None for the root itself
pub fn parent_dir(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&trimmed[..idx]),
        None => None,
    }
}

/// every proper ancestor of a path, outermost first ("/" included)
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut chain = Vec::new();
    let mut current = parent_dir(path);
    while let Some(dir) = current {
        chain.push(dir);
        current = parent_dir(dir);
    }
    chain.reverse();
    chain
}

/// number of segments below "/"
pub fn depth(path: &str) -> usize {
    segments(path).count()
}
