use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::jail::Jail;

/// kind of filesystem action, without its parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    RemoveFile,
    RemoveDir,
    CreateDir,
    CopyFile,
    CopyDir,
    PersistManifest,
}

/// one planned unit of work
///
/// every variant already carries its resolved jail target, so an action can be
/// described, compared and executed without knowing about any other action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// remove a managed file (or symlink) from the jail
    RemoveFile { path: String, target: PathBuf },
    /// remove a managed directory tree from the jail
    RemoveDir { path: String, target: PathBuf },
    /// create a directory (and missing parents) in the jail
    CreateDir { path: String, target: PathBuf },
    /// copy a host file to its jail location
    CopyFile { source: String, target: PathBuf },
    /// copy a host directory tree to its jail location
    CopyDir { source: String, target: PathBuf },
    /// write the new managed set; `changed` is false when it equals the previous one
    PersistManifest {
        manifest: PathBuf,
        paths: BTreeSet<String>,
        changed: bool,
    },
}

impl Action {
    pub fn remove_file(jail: &Jail, path: &str) -> Self {
        Action::RemoveFile {
            path: path.to_string(),
            target: jail.resolve(path),
        }
    }

    pub fn remove_dir(jail: &Jail, path: &str) -> Self {
        Action::RemoveDir {
            path: path.to_string(),
            target: jail.resolve(path),
        }
    }

    pub fn create_dir(jail: &Jail, path: &str) -> Self {
        Action::CreateDir {
            path: path.to_string(),
            target: jail.resolve(path),
        }
    }

    pub fn copy_file(jail: &Jail, source: &str) -> Self {
        Action::CopyFile {
            source: source.to_string(),
            target: jail.resolve(source),
        }
    }

    pub fn copy_dir(jail: &Jail, source: &str) -> Self {
        Action::CopyDir {
            source: source.to_string(),
            target: jail.resolve(source),
        }
    }

    pub fn persist_manifest(
        manifest: impl Into<PathBuf>,
        paths: BTreeSet<String>,
        previous: &BTreeSet<String>,
    ) -> Self {
        let changed = &paths != previous;
        Action::PersistManifest {
            manifest: manifest.into(),
            paths,
            changed,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::RemoveFile { .. } => ActionKind::RemoveFile,
            Action::RemoveDir { .. } => ActionKind::RemoveDir,
            Action::CreateDir { .. } => ActionKind::CreateDir,
            Action::CopyFile { .. } => ActionKind::CopyFile,
            Action::CopyDir { .. } => ActionKind::CopyDir,
            Action::PersistManifest { .. } => ActionKind::PersistManifest,
        }
    }

    /// host-side path the action is about (the manifest path for persist)
    pub fn path(&self) -> String {
        match self {
            Action::RemoveFile { path, .. }
            | Action::RemoveDir { path, .. }
            | Action::CreateDir { path, .. } => path.clone(),
            Action::CopyFile { source, .. } | Action::CopyDir { source, .. } => source.clone(),
            Action::PersistManifest { manifest, .. } => manifest.display().to_string(),
        }
    }

    /// does performing this action alter observable state
    pub fn is_change(&self) -> bool {
        match self {
            Action::PersistManifest { changed, .. } => *changed,
            _ => true,
        }
    }

    /// human-readable description, identical for real and dry runs
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::RemoveFile { path, .. } | Action::RemoveDir { path, .. } => {
                write!(f, "rm {}", path)
            }
            Action::CreateDir { path, .. } => write!(f, "mkdir {}", path),
            Action::CopyFile { source, target } | Action::CopyDir { source, target } => {
                write!(f, "cp {} {}", source, target.display())
            }
            Action::PersistManifest { manifest, .. } => {
                write!(f, "save manifest to {}", manifest.display())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptions() {
        let jail = Jail::new("/srv/jail");

        assert_eq!(Action::remove_file(&jail, "/b").to_string(), "rm /b");
        assert_eq!(Action::remove_dir(&jail, "/opt/old").to_string(), "rm /opt/old");
        assert_eq!(Action::create_dir(&jail, "/x/y").to_string(), "mkdir /x/y");
        assert_eq!(
            Action::copy_file(&jail, "/bin/ls").to_string(),
            "cp /bin/ls /srv/jail/bin/ls"
        );
        assert_eq!(
            Action::copy_dir(&jail, "/usr/share/terminfo").to_string(),
            "cp /usr/share/terminfo /srv/jail/usr/share/terminfo"
        );
        assert_eq!(
            Action::persist_manifest("/var/jailsync.mem", BTreeSet::new(), &BTreeSet::new())
                .description(),
            "save manifest to /var/jailsync.mem"
        );
    }

    #[test]
    fn test_targets_use_jail_resolution() {
        let jail = Jail::new("/srv/jail");

        match Action::copy_dir(&jail, "/etc/ssl") {
            Action::CopyDir { target, .. } => assert_eq!(target, PathBuf::from("/srv/jail/etc/ssl")),
            other => panic!("unexpected action: {:?}", other),
        }
        match Action::remove_file(&jail, "/lib/libz.so") {
            Action::RemoveFile { target, .. } => {
                assert_eq!(target, PathBuf::from("/srv/jail/lib/libz.so"))
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_persist_change_tracks_previous() {
        let previous: BTreeSet<String> = ["/a".to_string()].into_iter().collect();

        let same = Action::persist_manifest("/m", previous.clone(), &previous);
        assert!(!same.is_change());

        let grown: BTreeSet<String> = ["/a".to_string(), "/b".to_string()].into_iter().collect();
        let different = Action::persist_manifest("/m", grown, &previous);
        assert!(different.is_change());

        assert!(Action::create_dir(&Jail::new("/j"), "/x").is_change());
    }
}
