use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::index::JailTreeIndex;
use crate::jail::{ancestors, depth, normalize, Jail};
use crate::types::Action;

/// everything the jail should contain after this run
///
/// paths are normalized on insertion and duplicates collapse. a path declared
/// both as a file and as a directory is kept as a file only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DesiredSet {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
}

impl DesiredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// union of executables, their libraries, extra files and extra directories
    pub fn from_parts<S: AsRef<str>>(
        commands: &[S],
        libraries: &[S],
        other_files: &[S],
        dirs: &[S],
    ) -> Self {
        let mut set = Self::new();
        for file in commands.iter().chain(libraries).chain(other_files) {
            set.add_file(file.as_ref());
        }
        for dir in dirs {
            set.add_dir(dir.as_ref());
        }
        set
    }

    pub fn add_file(&mut self, path: &str) {
        let path = normalize(path);
        self.dirs.remove(&path);
        self.files.insert(path);
    }

    pub fn add_dir(&mut self, path: &str) {
        let path = normalize(path);
        if !self.files.contains(&path) {
            self.dirs.insert(path);
        }
    }

    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    pub fn dirs(&self) -> &BTreeSet<String> {
        &self.dirs
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path) || self.dirs.contains(path)
    }

    /// files and directories together
    pub fn all(&self) -> BTreeSet<String> {
        self.files.union(&self.dirs).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}

/// compute the ordered actions that converge the jail to `desired`
///
/// order: stale file removals, stale directory removals, missing parent
/// directories (ancestors first), file copies, directory copies, and finally
/// one manifest write carrying the whole desired set. every existence check
/// is answered by `index`; nothing here touches the filesystem.
pub fn plan(
    jail: &Jail,
    desired: &DesiredSet,
    previous: &BTreeSet<String>,
    index: &JailTreeIndex,
    manifest_path: &Path,
) -> Vec<Action> {
    let mut actions = Vec::new();

    // stale objects: managed last time, no longer declared
    let mut stale_files = Vec::new();
    let mut stale_dirs = Vec::new();
    for path in previous {
        let path = normalize(path);
        if desired.contains(&path) {
            continue;
        }
        if index.is_file(&path) {
            stale_files.push(path);
        } else if index.is_dir(&path) {
            stale_dirs.push(path);
        } else {
            debug!(path = %path, "stale entry already absent");
        }
    }

    // anything below a directory being removed goes with it
    let removed = Removed::new(stale_dirs);
    stale_files.retain(|p| !removed.covers_strictly(p));
    let stale_dirs: Vec<&String> = removed
        .dirs
        .iter()
        .filter(|d| !removed.covers_strictly(d))
        .collect();

    actions.extend(stale_files.iter().map(|p| Action::remove_file(jail, p)));
    actions.extend(stale_dirs.iter().map(|p| Action::remove_dir(jail, p)));

    // answers from the pre-run snapshot, minus whatever the removals above take away
    let present_file = |p: &str| index.is_file(p) && !removed.covers(p);
    let present_dir = |p: &str| index.is_dir(p) && !removed.covers(p);

    let missing_files: Vec<&String> = desired
        .files()
        .iter()
        .filter(|p| !present_file(p.as_str()))
        .collect();
    let missing_dirs: Vec<&String> = desired
        .dirs()
        .iter()
        .filter(|p| !present_dir(p.as_str()))
        .collect();

    let mut parents: Vec<&str> = missing_files
        .iter()
        .chain(&missing_dirs)
        .flat_map(|p| ancestors(p))
        .filter(|p| !present_dir(*p))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .collect();
    parents.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));

    actions.extend(parents.iter().map(|p| Action::create_dir(jail, p)));
    actions.extend(missing_files.iter().map(|p| Action::copy_file(jail, p)));
    actions.extend(missing_dirs.iter().map(|p| Action::copy_dir(jail, p)));

    let previous_normalized: BTreeSet<String> = previous.iter().map(|p| normalize(p)).collect();
    actions.push(Action::persist_manifest(
        manifest_path,
        desired.all(),
        &previous_normalized,
    ));

    debug!(
        stale_files = stale_files.len(),
        stale_dirs = stale_dirs.len(),
        missing_parents = parents.len(),
        missing_files = missing_files.len(),
        missing_dirs = missing_dirs.len(),
        "planned jail changes"
    );

    actions
}

/// stale directories scheduled for recursive removal
struct Removed {
    dirs: Vec<String>,
}

impl Removed {
    fn new(dirs: Vec<String>) -> Self {
        Self { dirs }
    }

    /// path is one of the removed directories or lies below one
    fn covers(&self, path: &str) -> bool {
        self.dirs.iter().any(|d| path == d.as_str() || is_below(path, d))
    }

    /// path lies below a removed directory
    fn covers_strictly(&self, path: &str) -> bool {
        self.dirs.iter().any(|d| is_below(path, d))
    }
}

fn is_below(path: &str, dir: &str) -> bool {
    if dir == "/" {
        return path != "/";
    }
    path.strip_prefix(dir)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}
