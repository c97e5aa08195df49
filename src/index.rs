//! in-memory snapshot of the jail's on-disk layout
//!
//! built from a single walk before planning; every existence question the
//! planner asks is answered from here without touching the filesystem again.

use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{walk_error, Result};
use crate::jail::segments;

/// a node in the jail tree
///
/// anything that is not a directory (regular file, symlink, device) is a leaf.
/// symlinks are never followed, so a link to a directory is a leaf too.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Leaf,
    Directory(BTreeMap<String, Node>),
}

impl Node {
    fn children(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Directory(children) => Some(children),
            Node::Leaf => None,
        }
    }

    fn count(&self) -> usize {
        match self {
            Node::Leaf => 1,
            Node::Directory(children) => 1 + children.values().map(Node::count).sum::<usize>(),
        }
    }
}

/// pre-run snapshot of everything under the jail root
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JailTreeIndex {
    /// None when the jail root did not exist
    root: Option<Node>,
}

impl JailTreeIndex {
    /// an index for a jail that does not exist yet
    pub fn empty() -> Self {
        Self { root: None }
    }

    /// walk the jail root once and record its layout
    ///
    /// a missing (or non-directory) root gives an empty index.
    pub fn build(jail_root: &Path) -> Result<Self> {
        if !jail_root.is_dir() {
            return Ok(Self::empty());
        }

        let mut root = BTreeMap::new();

        for entry in WalkDir::new(jail_root).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| walk_error(jail_root, e))?;

            let rel = match entry.path().strip_prefix(jail_root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let names: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();

            let node = if entry.file_type().is_dir() {
                Node::Directory(BTreeMap::new())
            } else {
                Node::Leaf
            };
            insert(&mut root, &names, node);
        }

        Ok(Self {
            root: Some(Node::Directory(root)),
        })
    }

    /// build an index from a list of (path, is_dir) pairs, ancestors implied
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut root = BTreeMap::new();
        for (path, is_dir) in entries {
            let names: Vec<String> = segments(path).map(str::to_string).collect();
            let node = if is_dir {
                Node::Directory(BTreeMap::new())
            } else {
                Node::Leaf
            };
            insert(&mut root, &names, node);
        }
        Self {
            root: Some(Node::Directory(root)),
        }
    }

    /// is this absolute path present in the jail as a non-directory
    pub fn is_file(&self, path: &str) -> bool {
        matches!(self.lookup(path), Some(Node::Leaf))
    }

    /// is this absolute path present in the jail as a directory
    ///
    /// "/" asks about the jail root itself.
    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.lookup(path), Some(Node::Directory(_)))
    }

    /// did the jail root exist when the index was built
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// number of entries below the jail root
    pub fn len(&self) -> usize {
        self.root.as_ref().map(|r| r.count() - 1).unwrap_or(0)
    }

    fn lookup(&self, path: &str) -> Option<&Node> {
        let mut node = self.root.as_ref()?;
        for name in segments(path) {
            node = node.children()?.get(name)?;
        }
        Some(node)
    }
}

fn insert(root: &mut BTreeMap<String, Node>, names: &[String], node: Node) {
    let Some((last, parents)) = names.split_last() else {
        return;
    };

    let mut current = root;
    for name in parents {
        let child = current
            .entry(name.clone())
            .or_insert_with(|| Node::Directory(BTreeMap::new()));
        if let Node::Leaf = child {
            *child = Node::Directory(BTreeMap::new());
        }
        current = match child {
            Node::Directory(children) => children,
            Node::Leaf => return,
        };
    }

    // keep already-recorded children when a directory is reported again
    let known_dir = matches!(current.get(last), Some(Node::Directory(_)));
    if !(known_dir && matches!(node, Node::Directory(_))) {
        current.insert(last.clone(), node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let index = JailTreeIndex::build(&dir.path().join("nope")).unwrap();

        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(!index.is_file("/bin/ls"));
        assert!(!index.is_dir("/bin"));
        assert!(!index.is_dir("/"));
    }

    #[test]
    fn test_build_reflects_layout() {
        let dir = tempdir().unwrap();
        let jail = dir.path().join("jail");
        fs::create_dir_all(jail.join("lib/x86_64-linux-gnu")).unwrap();
        fs::create_dir_all(jail.join("bin")).unwrap();
        fs::write(jail.join("bin/ls"), "elf").unwrap();
        fs::write(jail.join("lib/x86_64-linux-gnu/libc.so.6"), "elf").unwrap();

        let index = JailTreeIndex::build(&jail).unwrap();

        assert!(!index.is_empty());
        assert_eq!(index.len(), 5);
        assert!(index.is_dir("/"));
        assert!(index.is_dir("/bin"));
        assert!(index.is_file("/bin/ls"));
        assert!(index.is_dir("/lib/x86_64-linux-gnu"));
        assert!(index.is_file("/lib/x86_64-linux-gnu/libc.so.6"));
        assert!(!index.is_file("/bin/cat"));
        assert!(!index.is_dir("/usr"));
    }

    #[test]
    fn test_file_and_dir_are_exclusive() {
        let index = JailTreeIndex::from_entries([("/etc", true), ("/etc/passwd", false)]);

        assert!(index.is_dir("/etc"));
        assert!(!index.is_file("/etc"));
        assert!(index.is_file("/etc/passwd"));
        assert!(!index.is_dir("/etc/passwd"));

        // a path below a leaf does not exist
        assert!(!index.is_file("/etc/passwd/x"));
        assert!(!index.is_dir("/etc/passwd/x"));
    }

    #[test]
    fn test_symlink_is_leaf() {
        let dir = tempdir().unwrap();
        let jail = dir.path().join("jail");
        fs::create_dir_all(jail.join("real")).unwrap();
        symlink("real", jail.join("link")).unwrap();

        let index = JailTreeIndex::build(&jail).unwrap();

        assert!(index.is_dir("/real"));
        assert!(index.is_file("/link"));
        assert!(!index.is_dir("/link"));
    }

    #[test]
    fn test_index_is_a_snapshot() {
        let dir = tempdir().unwrap();
        let jail = dir.path().join("jail");
        fs::create_dir_all(&jail).unwrap();

        let index = JailTreeIndex::build(&jail).unwrap();
        fs::write(jail.join("late"), "x").unwrap();

        assert!(!index.is_file("/late"));
    }

    #[test]
    fn test_query_tolerates_extra_separators() {
        let index = JailTreeIndex::from_entries([("/usr/lib/libz.so", false)]);

        assert!(index.is_file("/usr//lib/libz.so"));
        assert!(index.is_dir("/usr/lib/"));
    }
}
