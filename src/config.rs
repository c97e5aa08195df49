use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};
use crate::jail::escapes_root;

/// default location of the managed-object record
pub const DEFAULT_MANIFEST_PATH: &str = "/var/jailsync.mem";

/// default dynamic-dependency inspector
pub const DEFAULT_INSPECTOR: &str = "ldd";

/// desired state of the jail
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Present,
    Absent,
}

impl FromStr for State {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "present" => Ok(State::Present),
            "absent" => Ok(State::Absent),
            _ => Err(Error::InvalidState(s.to_string())),
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Present => write!(f, "present"),
            State::Absent => write!(f, "absent"),
        }
    }
}

/// run configuration, usually read from a toml file and overlaid with cli flags
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub state: State,
    /// root of the mirrored subtree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jail_directory: Option<PathBuf>,
    /// executables whose shared libraries are pulled in as well
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_files: Vec<String>,
    /// directories copied recursively
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dirs: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    #[serde(default = "default_inspector")]
    pub inspector: String,
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST_PATH)
}

fn default_inspector() -> String {
    DEFAULT_INSPECTOR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state: State::default(),
            jail_directory: None,
            commands: vec![],
            other_files: vec![],
            dirs: vec![],
            dry_run: false,
            manifest_path: default_manifest_path(),
            inspector: default_inspector(),
        }
    }
}

impl Config {
    /// create a config for the given jail root with everything else defaulted
    pub fn new(jail_directory: impl Into<PathBuf>) -> Self {
        Self {
            jail_directory: Some(jail_directory.into()),
            ..Self::default()
        }
    }

    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        Self::from_toml(&content)
    }

    /// parse config from toml text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// the jail root, or a configuration error when it was never given
    pub fn jail_directory(&self) -> Result<&Path> {
        self.jail_directory
            .as_deref()
            .ok_or(Error::MissingJailDirectory)
    }

    /// check everything that must hold before any filesystem mutation
    pub fn validate(&self) -> Result<()> {
        let jail = self.jail_directory()?;
        if !jail.is_absolute() {
            return Err(Error::RelativePath(jail.display().to_string()));
        }
        if jail.parent().is_none() {
            return Err(Error::UnsafeJailDirectory(jail.to_path_buf()));
        }

        for path in self.commands.iter().chain(&self.other_files).chain(&self.dirs) {
            if !path.starts_with('/') {
                return Err(Error::RelativePath(path.clone()));
            }
            if escapes_root(path) {
                return Err(Error::PathEscapesRoot(path.clone()));
            }
        }

        Ok(())
    }
}
