use std::path::PathBuf;

/// error type for jailsync operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("jail_directory is required")]
    MissingJailDirectory,

    #[error("refusing to manage {0} as a jail directory")]
    UnsafeJailDirectory(PathBuf),

    #[error("invalid state '{0}': expected 'present' or 'absent'")]
    InvalidState(String),

    #[error("path must be absolute: {0}")]
    RelativePath(String),

    #[error("path climbs above the filesystem root: {0}")]
    PathEscapesRoot(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to resolve dependencies of {path}: {reason}")]
    DependencyResolution { path: String, reason: String },

    #[error("action '{failed}' failed after {} completed: {source}", .completed.len())]
    ActionFailed {
        completed: Vec<String>,
        failed: String,
        #[source]
        source: Box<Error>,
    },

    #[error("lock contention on manifest {0}")]
    LockContention(PathBuf),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk error under {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// true for errors raised while validating configuration, before any mutation
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingJailDirectory
                | Error::UnsafeJailDirectory(_)
                | Error::InvalidState(_)
                | Error::RelativePath(_)
                | Error::PathEscapesRoot(_)
                | Error::Config(_)
        )
    }
}

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}

/// convert a walkdir error, keeping the underlying io error when there is one
pub(crate) fn walk_error(root: &std::path::Path, err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| root.to_path_buf());
    match err.into_io_error() {
        Some(source) => Error::Io { path, source },
        None => Error::Walk {
            path,
            message: "filesystem loop detected".to_string(),
        },
    }
}
