//! shared-library dependency resolution through an external inspector (ldd)

use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::jail::normalize;

/// resolves the shared libraries an executable needs at load time
#[derive(Clone, Debug)]
pub struct DependencyResolver {
    inspector: String,
}

impl DependencyResolver {
    /// use the given inspector program; it is invoked as `<inspector> <executable>`
    pub fn new(inspector: impl Into<String>) -> Self {
        Self {
            inspector: inspector.into(),
        }
    }

    pub fn inspector(&self) -> &str {
        &self.inspector
    }

    /// library paths required by one executable, in inspector output order
    ///
    /// the result is not deduplicated. the executable itself is never part of it.
    pub fn resolve(&self, executable: &str) -> Result<Vec<String>> {
        let output = Command::new(&self.inspector)
            .arg(executable)
            .output()
            .map_err(|e| Error::DependencyResolution {
                path: executable.to_string(),
                reason: format!("cannot run {}: {}", self.inspector, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = [stderr.trim(), stdout.trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .unwrap_or("no output");
            return Err(Error::DependencyResolution {
                path: executable.to_string(),
                reason: format!("{} exited with {}: {}", self.inspector, output.status, detail),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let itself = normalize(executable);
        let libs: Vec<String> = parse_inspector_output(&stdout)
            .into_iter()
            .filter(|lib| *lib != itself)
            .collect();

        debug!(executable, count = libs.len(), "resolved shared libraries");
        Ok(libs)
    }

    /// libraries of every executable, concatenated
    pub fn resolve_all<S: AsRef<str>>(&self, executables: &[S]) -> Result<Vec<String>> {
        let mut libs = Vec::new();
        for executable in executables {
            libs.extend(self.resolve(executable.as_ref())?);
        }
        Ok(libs)
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_INSPECTOR)
    }
}

/// extract library paths from inspector output
///
/// recognised line shapes:
///
/// ```text
///     libc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007f1c2a000000)
///     /lib64/ld-linux-x86-64.so.2 (0x00007f1c2a400000)
/// ```
///
/// anything else (vdso entries, "not found" libraries, headers) is ignored.
/// `$ORIGIN`-relative paths come back with their `..` segments resolved.
pub fn parse_inspector_output(text: &str) -> Vec<String> {
    text.lines().filter_map(parse_line).map(normalize).collect()
}

fn parse_line(line: &str) -> Option<&str> {
    let line = line.trim();

    let candidate = match line.split_once(" => ") {
        Some((_, resolved)) => resolved.trim_start(),
        None => line,
    };

    // path must be followed by its load address, which is dropped
    let (path, address) = candidate.split_once(' ')?;
    if !address.trim_start().starts_with("(0x") {
        return None;
    }
    if !path.starts_with('/') {
        return None;
    }

    Some(path)
}
