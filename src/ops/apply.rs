use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fs::{
    copy_dir_recursive, copy_file, create_directory, remove_dir_all_if_exists,
    remove_file_if_exists,
};
use crate::manifest;
use crate::types::{Action, ChangeReport};

/// perform the effect of a single action
pub fn perform(action: &Action) -> Result<()> {
    match action {
        Action::RemoveFile { target, .. } => {
            if !remove_file_if_exists(target)? {
                debug!(target = %target.display(), "file already removed");
            }
        }
        Action::RemoveDir { target, .. } => {
            if !remove_dir_all_if_exists(target)? {
                debug!(target = %target.display(), "directory already removed");
            }
        }
        Action::CreateDir { target, .. } => create_directory(target)?,
        Action::CopyFile { source, target } => copy_file(Path::new(source), target)?,
        Action::CopyDir { source, target } => copy_dir_recursive(Path::new(source), target)?,
        Action::PersistManifest {
            manifest: path,
            paths,
            ..
        } => manifest::save(path, paths)?,
    }
    Ok(())
}

/// perform every action in order, stopping at the first failure
///
/// on failure the error carries the descriptions of the actions that did
/// complete, plus the one that failed. the manifest write is the last action of
/// any plan, so a failed run leaves the previous manifest in place.
pub fn apply(actions: &[Action]) -> Result<ChangeReport> {
    let mut report = ChangeReport::new();

    for action in actions {
        if let Err(source) = perform(action) {
            return Err(Error::ActionFailed {
                completed: report.messages,
                failed: action.description(),
                source: Box::new(source),
            });
        }
        info!("{}", action);
        report.record(action);
    }

    Ok(report)
}

/// report what `apply` would do without touching anything
pub fn dry_run(actions: &[Action]) -> ChangeReport {
    for action in actions {
        info!("would {}", action);
    }
    ChangeReport::from_actions(actions)
}

/// apply or preview a plan
pub fn execute(actions: &[Action], dry: bool) -> Result<ChangeReport> {
    if dry {
        Ok(dry_run(actions))
    } else {
        apply(actions)
    }
}
