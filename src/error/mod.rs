// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!            TestbedError (~16 bytes)
//!                     |
//!   +--------+--------+--------+--------+--------+
//!   |        |        |        |        |        |
//!   v        v        v        v        v        v
//! Process Teardown  Config    Fs    Network     Io
//!   Box     Box      Box     Box     Box       Box
//!
//! Sub-errors (unboxed internally):
//!   Process   Spawn, Drain, Timeout, PrematureExit, ExitLost
//!   Teardown  Signal, Io, Failed
//!   Config    ParseError, InvalidValue
//!   Fs        InvalidPath, IoError
//!   Network   Request, InvalidMethod
//! ```

use std::sync::Arc;
use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`TestbedError`].
pub type TestbedResult<T> = std::result::Result<T, TestbedError>;

/// Top-level error type.
///
/// All sub-errors are boxed to keep this enum at ~16 bytes on the stack.
#[derive(Debug, Error)]
pub enum TestbedError {
    /// Process runner error.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// Teardown action failed.
    #[error("teardown error: {0}")]
    Teardown(#[from] Box<TeardownError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Filesystem error.
    #[error("filesystem error: {0}")]
    Fs(#[from] Box<FsError>),

    /// Network operation failed.
    #[error("network error: {0}")]
    Network(#[from] Box<NetworkError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for TestbedError {
                fn from(err: $error) -> Self {
                    TestbedError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ProcessError => Process,
    TeardownError => Teardown,
    ConfigError => Config,
    FsError => Fs,
    NetworkError => Network,
    std::io::Error => Io,
}

// --- Process Errors ---

/// Process runner errors.
///
/// Cloneable so that every caller of `wait_until_exit` observes the same
/// outcome.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The executable could not be started (not found, bad working directory, ...).
    #[error("failed to spawn process '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Reading stdout or stderr failed.
    #[error("failed to read {stream} of process '{command}': {message}")]
    Drain {
        command: String,
        stream: String,
        message: String,
    },

    /// The expected output did not appear within the time budget.
    #[error("Timeout exceeded after {timeout_ms}ms without seeing expected output {pattern}:\n{output}")]
    Timeout {
        pattern: String,
        timeout_ms: u128,
        output: String,
    },

    /// The process exited before the expected output appeared.
    #[error("Process ended with code {code} without emitting expected output {pattern}:\n{output}")]
    PrematureExit {
        pattern: String,
        code: i32,
        output: String,
    },

    /// The exit watcher stopped without reporting an outcome.
    #[error("process '{command}' was abandoned before its exit could be observed")]
    ExitLost { command: String },
}

impl ProcessError {
    /// Returns the accumulated output carried by timeout and premature-exit errors.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Timeout { output, .. } | Self::PrematureExit { output, .. } => Some(output),
            _ => None,
        }
    }
}

// --- Teardown Errors ---

/// Errors raised by teardown actions.
#[derive(Debug, Error)]
pub enum TeardownError {
    /// Delivering the termination signal to a process group failed.
    #[error("failed to signal process group {pgid}: {source}")]
    Signal {
        pgid: i32,
        #[source]
        source: std::io::Error,
    },

    /// Removing a filesystem resource failed.
    #[error("failed to remove '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Any other teardown failure.
    #[error("teardown '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("failed to parse config '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Filesystem Errors ---

/// Filesystem operation errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path escapes the directory it must stay inside.
    #[error("path '{path}' is not inside '{root}'")]
    InvalidPath { path: String, root: String },

    /// General I/O error.
    #[error("I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// --- Network Errors ---

/// HTTP shim errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request could not be sent or its body could not be read.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Unknown HTTP method.
    #[error("invalid http method: {0}")]
    InvalidMethod(String),
}

#[cfg(test)]
mod tests;
