// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scratch directories owned by a test.
//!
//! ```text
//! use_temporary_directory(t)
//!   tempfile::Builder  prefix "testbed-", parent from config or system tmp
//!   keep()             lifetime now owned by the teardown, not the guard
//!   register_teardown  remove_dir_all (NotFound --> Ok)
//!
//! write_file(rel, contents)
//!   rel must stay inside the directory
//!   de-indent --> trim --> + "\n"
//!   create parents, write
//!   starts with "#!" --> chmod 0o755 (unix)
//! ```

use anyhow::Context;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};

use crate::error::{FsError, Result, TeardownError};
use crate::lifecycle::TestContext;

const PREFIX: &str = "testbed-";

/// A directory that is deleted when its test finishes.
#[derive(Debug, Clone)]
pub struct TemporaryDirectory {
    path: PathBuf,
}

/// Creates a fresh directory for the test `t`.
///
/// The parent is `tempdir.parent` from the test's configuration, or the
/// system temp dir.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn use_temporary_directory(t: &TestContext) -> Result<TemporaryDirectory> {
    let parent = t
        .config()
        .tempdir
        .parent
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    use_temporary_directory_in(t, parent)
}

/// Creates a fresh directory for the test `t` inside `parent`.
///
/// # Errors
///
/// Returns an error if `parent` does not exist or the directory cannot be
/// created.
pub fn use_temporary_directory_in(
    t: &TestContext,
    parent: impl AsRef<Path>,
) -> Result<TemporaryDirectory> {
    let parent = parent.as_ref();
    let path = tempfile::Builder::new()
        .prefix(PREFIX)
        .tempdir_in(parent)
        .with_context(|| format!("failed to create temporary directory in {}", parent.display()))?
        .keep();
    debug!(test = %t.title(), path = %path.display(), "created temporary directory");

    let target = path.clone();
    t.register_teardown(format!("remove {}", path.display()), move || {
        remove_directory(&target)
    });

    Ok(TemporaryDirectory { path })
}

fn remove_directory(path: &Path) -> std::result::Result<(), TeardownError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            trace!(path = %path.display(), "removed temporary directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(TeardownError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

impl TemporaryDirectory {
    /// Absolute path of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `contents` to `relative`, creating parent directories.
    ///
    /// The text is de-indented by its smallest common indentation, trimmed
    /// and given a single trailing newline, so it can be written as an
    /// indented raw string in the test. Files starting with `#!` are made
    /// executable.
    ///
    /// # Errors
    ///
    /// Returns `FsError::InvalidPath` if `relative` is absolute or climbs
    /// out of the directory, or an I/O error if writing fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use testbed_rs::lifecycle::TestContext;
    /// # use testbed_rs::tempdir::use_temporary_directory;
    /// # fn demo() -> anyhow::Result<()> {
    /// let t = TestContext::new("writes a script");
    /// let dir = use_temporary_directory(&t)?;
    /// let script = dir.write_file(
    ///     "bin/hello",
    ///     r"
    ///         #!/bin/sh
    ///         echo hello
    ///     ",
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn write_file(&self, relative: impl AsRef<Path>, contents: &str) -> Result<PathBuf> {
        let relative = relative.as_ref();
        let target = self.resolve(relative)?;

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| FsError::IoError {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let text = normalize_contents(contents);
        std::fs::write(&target, &text)
            .with_context(|| format!("failed to write {}", target.display()))?;

        if text.starts_with("#!") {
            make_executable(&target)?;
        }

        trace!(path = %target.display(), bytes = text.len(), "wrote file");
        Ok(target)
    }

    fn resolve(&self, relative: &Path) -> std::result::Result<PathBuf, FsError> {
        let escapes = relative.as_os_str().is_empty()
            || relative.components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });
        if escapes {
            return Err(FsError::InvalidPath {
                path: relative.display().to_string(),
                root: self.path.display().to_string(),
            });
        }
        Ok(self.path.join(relative))
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to make {} executable", path.display()))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Strips the common leading indentation, trims, and appends a newline.
pub(crate) fn normalize_contents(contents: &str) -> String {
    let indent = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let dedented: Vec<&str> = contents
        .lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect();

    let mut text = dedented.join("\n").trim().to_string();
    text.push('\n');
    text
}

#[cfg(test)]
mod tests;
