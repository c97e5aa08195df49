use tracing::{debug, info};

use crate::config::{Config, State};
use crate::deps::DependencyResolver;
use crate::error::Result;
use crate::index::JailTreeIndex;
use crate::jail::Jail;
use crate::manifest::{self, ManifestLock};
use crate::ops::apply::execute;
use crate::ops::destroy::destroy;
use crate::ops::plan::{plan, DesiredSet};
use crate::types::ChangeReport;

/// run one invocation: validate, then converge or tear down according to `state`
///
/// real runs hold the manifest lock for their whole duration; dry runs take no
/// lock and write nothing. an absent run removes the lock file along with the
/// manifest.
pub fn sync(config: &Config) -> Result<ChangeReport> {
    config.validate()?;

    let report = match config.state {
        State::Present => {
            let _lock = if config.dry_run {
                None
            } else {
                Some(ManifestLock::acquire(&config.manifest_path)?)
            };
            converge(config)?
        }
        State::Absent => {
            let lock = if config.dry_run {
                None
            } else {
                ManifestLock::acquire_for_removal(&config.manifest_path)?
            };
            let jail = Jail::new(config.jail_directory()?);
            let report = destroy(&jail, &config.manifest_path, config.dry_run)?;
            if let Some(lock) = lock {
                lock.remove()?;
            }
            report
        }
    };

    info!(
        state = %config.state,
        dry_run = config.dry_run,
        changed = report.changed,
        actions = report.messages.len(),
        "jail sync finished"
    );
    Ok(report)
}

/// bring the jail to exactly the declared contents
///
/// dependency resolution finishes before anything is executed, so a resolver
/// failure never leaves a half-applied closure behind.
pub fn converge(config: &Config) -> Result<ChangeReport> {
    let jail = Jail::new(config.jail_directory()?);

    let resolver = DependencyResolver::new(config.inspector.as_str());
    let libraries = resolver.resolve_all(&config.commands)?;

    let desired = DesiredSet::from_parts(
        &config.commands,
        &libraries,
        &config.other_files,
        &config.dirs,
    );
    let previous = manifest::load(&config.manifest_path)?;
    let index = JailTreeIndex::build(jail.root())?;

    debug!(
        desired = desired.len(),
        previous = previous.len(),
        indexed = index.len(),
        "collected jail state"
    );

    let actions = plan(&jail, &desired, &previous, &index, &config.manifest_path);
    execute(&actions, config.dry_run)
}
