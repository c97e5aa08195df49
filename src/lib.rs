//! jailsync - idempotent chroot jail synchronizer
//!
//! keeps a plain directory ("jail") holding exactly the declared executables,
//! their shared-library closure and any extra files and directories. repeated
//! runs converge; entries dropped from the declaration are removed again.
//!
//! # Core concepts
//!
//! - **Desired set**: executables + their libraries + extra files + extra directories
//! - **Jail tree index**: a one-walk snapshot of what the jail holds before the run
//! - **Manifest**: the paths the previous successful run was responsible for
//! - **Plan**: ordered [`Action`]s computed purely from the three above
//!
//! # Run order
//!
//! stale files are removed, then stale directories, then missing parent
//! directories are created (ancestors first), files and directories are
//! copied, and the manifest is written last. a failure anywhere before the
//! manifest write leaves the previous manifest authoritative.
//!
//! # Example usage
//!
//! ```no_run
//! use jailsync::{ops, Config};
//!
//! let mut config = Config::new("/srv/jail");
//! config.commands = vec!["/bin/sh".to_string()];
//! config.other_files = vec!["/etc/passwd".to_string()];
//!
//! let report = ops::sync(&config).unwrap();
//! for message in &report.messages {
//!     println!("{}", message);
//! }
//! ```

mod config;
mod error;
mod jail;

pub mod deps;
pub mod fs;
pub mod index;
pub mod manifest;
pub mod ops;
pub mod types;

pub use config::{Config, State, DEFAULT_INSPECTOR, DEFAULT_MANIFEST_PATH};
pub use deps::{parse_inspector_output, DependencyResolver};
pub use error::{Error, IoResultExt, Result};
pub use index::JailTreeIndex;
pub use jail::{ancestors, normalize, parent_dir, Jail};
pub use manifest::ManifestLock;
pub use ops::DesiredSet;
pub use types::{Action, ActionKind, ChangeReport};
