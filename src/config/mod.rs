// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration for the test helpers.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. testbed.toml (cwd, optional)
//! 3. TESTBED_* env vars
//! 4. explicit overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! TESTBED_LOG_LEVEL=4                  → log.level = 4
//! TESTBED_PROCESS_WAIT_TIMEOUT_MS=2500 → process.wait_timeout_ms = 2500
//! TESTBED_PROCESS_TEARDOWN_SIGNAL=SIGKILL
//! TESTBED_TEMPDIR_PARENT=/scratch      → tempdir.parent = "/scratch"
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

use loader::ConfigLoader;
use types::{LogSection, ProcessSection, TempdirSection};

/// File name picked up from the working directory by [`TestbedConfig::load`].
pub const CONFIG_FILE: &str = "testbed.toml";

/// Environment variable prefix read by [`TestbedConfig::load`].
pub const ENV_PREFIX: &str = "TESTBED";

/// Complete helper configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestbedConfig {
    /// Logging options.
    pub log: LogSection,
    /// Process runner options.
    pub process: ProcessSection,
    /// Temporary directory options.
    pub tempdir: TempdirSection,
}

impl TestbedConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use testbed_rs::config::TestbedConfig;
    ///
    /// let config = TestbedConfig::builder()
    ///     .add_toml_file_optional("testbed.toml")
    ///     .with_env_prefix("TESTBED")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load the standard layering: defaults, optional `testbed.toml`, then
    /// `TESTBED_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `testbed.toml` is malformed or a value is invalid.
    pub fn load() -> Result<Self> {
        Self::builder()
            .add_toml_file_optional(CONFIG_FILE)
            .with_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `TestbedConfig` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `TestbedConfig` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Validate values that serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::InvalidValue` for a zero wait timeout or an
    /// unknown teardown signal.
    pub fn validate(&self) -> Result<()> {
        self.process.validate()?;
        Ok(())
    }
}
