use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::fs::{remove_dir_all_if_exists, remove_file_if_exists};
use crate::jail::Jail;
use crate::types::ChangeReport;

/// remove the jail tree and the manifest
///
/// both are optional; `changed` is set only for what actually existed.
pub fn destroy(jail: &Jail, manifest_path: &Path, dry_run: bool) -> Result<ChangeReport> {
    let mut report = ChangeReport::new();

    let jail_message = format!("rm {}", jail.root().display());
    let removed_jail = if dry_run {
        jail.root().symlink_metadata().is_ok()
    } else {
        remove_dir_all_if_exists(jail.root())?
    };
    if removed_jail {
        info!("{}", jail_message);
        report.push_change(jail_message);
    }

    let manifest_message = format!("rm {}", manifest_path.display());
    let removed_manifest = if dry_run {
        manifest_path.symlink_metadata().is_ok()
    } else {
        remove_file_if_exists(manifest_path)?
    };
    if removed_manifest {
        info!("{}", manifest_message);
        report.push_change(manifest_message);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_destroy_twice() {
        let dir = tempdir().unwrap();
        let jail = Jail::new(dir.path().join("jail"));
        let manifest = dir.path().join("jail.mem");
        fs::create_dir_all(jail.root().join("bin")).unwrap();
        fs::write(jail.root().join("bin/sh"), "elf").unwrap();
        fs::write(&manifest, "/bin/sh\n").unwrap();

        let first = destroy(&jail, &manifest, false).unwrap();
        assert!(first.changed);
        assert_eq!(first.messages.len(), 2);
        assert!(!jail.root().exists());
        assert!(!manifest.exists());

        let second = destroy(&jail, &manifest, false).unwrap();
        assert!(!second.changed);
        assert!(second.messages.is_empty());
    }

    #[test]
    fn test_destroy_only_manifest_left() {
        let dir = tempdir().unwrap();
        let jail = Jail::new(dir.path().join("jail"));
        let manifest = dir.path().join("jail.mem");
        fs::write(&manifest, "/bin/sh\n").unwrap();

        let report = destroy(&jail, &manifest, false).unwrap();

        assert!(report.changed);
        assert_eq!(
            report.messages,
            vec![format!("rm {}", manifest.display())]
        );
    }

    #[test]
    fn test_destroy_dry_run_keeps_everything() {
        let dir = tempdir().unwrap();
        let jail = Jail::new(dir.path().join("jail"));
        let manifest = dir.path().join("jail.mem");
        fs::create_dir_all(jail.root()).unwrap();
        fs::write(&manifest, "").unwrap();

        let preview = destroy(&jail, &manifest, true).unwrap();
        assert!(jail.root().exists());
        assert!(manifest.exists());

        let report = destroy(&jail, &manifest, false).unwrap();
        assert_eq!(preview, report);
    }
}
