// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration sections.
//!
//! ```text
//! TestbedConfig: LogSection, ProcessSection, TempdirSection
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Default budget for `wait_for_output`.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 1000;

/// Default signal sent to a process group at teardown.
pub const DEFAULT_TEARDOWN_SIGNAL: &str = "SIGTERM";

/// Logging options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    /// Console log level (0-6).
    pub level: LogLevel,
}

/// Process runner options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessSection {
    /// Budget for `wait_for_output` when none is given, in milliseconds.
    pub wait_timeout_ms: u64,
    /// Signal name sent to the process group at teardown (`SIGTERM`, `SIGKILL`, ...).
    pub teardown_signal: String,
}

impl Default for ProcessSection {
    fn default() -> Self {
        Self {
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            teardown_signal: DEFAULT_TEARDOWN_SIGNAL.to_string(),
        }
    }
}

impl ProcessSection {
    /// Returns the default wait budget as a `Duration`.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.wait_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                section: "process".to_string(),
                key: "wait_timeout_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        #[cfg(unix)]
        {
            use std::str::FromStr;
            if nix::sys::signal::Signal::from_str(&self.teardown_signal).is_err() {
                return Err(ConfigError::InvalidValue {
                    section: "process".to_string(),
                    key: "teardown_signal".to_string(),
                    message: format!("unknown signal '{}'", self.teardown_signal),
                });
            }
        }
        Ok(())
    }
}

/// Temporary directory options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TempdirSection {
    /// Directory in which temporary directories are created.
    /// `None` uses the system temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<PathBuf>,
}
