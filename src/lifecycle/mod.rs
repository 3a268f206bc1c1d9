// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-test lifecycle: teardown registration and execution.
//!
//! ```text
//! TestContext::new("title")  /  with_config  /  load
//!   init_test_logging(config.log.level)   first context in the binary wins
//!   register_teardown(a)   stack: [a]
//!   register_teardown(b)   stack: [a, b]
//!        |
//!        v
//! finish() or Drop
//!   run b, then a          (LIFO, each exactly once)
//!   collect failures       (finish: Err(first), Drop: panic)
//! ```

use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error};

use crate::config::TestbedConfig;
use crate::error::TeardownError;
use crate::logging::init_test_logging;

type TeardownAction = Box<dyn FnOnce() -> Result<(), TeardownError> + Send>;

struct Teardown {
    name: String,
    action: TeardownAction,
}

/// The per-test context that owns cleanup actions.
///
/// Create one at the top of a test and keep it alive for the whole test
/// body. Helpers such as [`crate::process::run_process`] register their
/// cleanup here. Teardowns run when [`TestContext::finish`] is called or,
/// failing that, when the context is dropped, which also covers a test that
/// panics halfway through.
///
/// # Example
///
/// ```no_run
/// use testbed_rs::lifecycle::TestContext;
///
/// let t = TestContext::new("cleanup runs last");
/// t.register_teardown("say goodbye", || {
///     println!("goodbye");
///     Ok(())
/// });
/// t.finish().unwrap();
/// ```
pub struct TestContext {
    title: String,
    config: TestbedConfig,
    teardowns: Mutex<Vec<Teardown>>,
}

impl TestContext {
    /// Creates a context with default configuration.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_config(title, TestbedConfig::default())
    }

    /// Creates a context with explicit configuration.
    ///
    /// Installs the test log subscriber at `config.log.level` unless one is
    /// already in place. `RUST_LOG`, when set, takes precedence.
    pub fn with_config(title: impl Into<String>, config: TestbedConfig) -> Self {
        init_test_logging(config.log.level);
        Self {
            title: title.into(),
            config,
            teardowns: Mutex::new(Vec::new()),
        }
    }

    /// Creates a context from `testbed.toml` and `TESTBED_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or is invalid.
    pub fn load(title: impl Into<String>) -> crate::error::Result<Self> {
        Ok(Self::with_config(title, TestbedConfig::load()?))
    }

    /// Returns the test title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the configuration helpers should use.
    #[must_use]
    pub const fn config(&self) -> &TestbedConfig {
        &self.config
    }

    /// Registers a cleanup action.
    ///
    /// Actions run exactly once, after the test body, most recent first.
    pub fn register_teardown<F>(&self, name: impl Into<String>, action: F)
    where
        F: FnOnce() -> Result<(), TeardownError> + Send + 'static,
    {
        let name = name.into();
        debug!(test = %self.title, teardown = %name, "registered teardown");
        self.lock().push(Teardown {
            name,
            action: Box::new(action),
        });
    }

    /// Number of teardowns still pending.
    #[must_use]
    pub fn pending_teardowns(&self) -> usize {
        self.lock().len()
    }

    /// Runs all pending teardowns now.
    ///
    /// Every action runs even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered (in LIFO order). All failures
    /// are logged.
    pub fn finish(self) -> Result<(), TeardownError> {
        let mut failures = self.run_teardowns();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.remove(0))
        }
    }

    fn run_teardowns(&self) -> Vec<TeardownError> {
        let pending = std::mem::take(&mut *self.lock());
        let mut failures = Vec::new();
        for teardown in pending.into_iter().rev() {
            debug!(test = %self.title, teardown = %teardown.name, "running teardown");
            if let Err(e) = (teardown.action)() {
                error!(test = %self.title, teardown = %teardown.name, error = %e, "teardown failed");
                failures.push(e);
            }
        }
        failures
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Teardown>> {
        self.teardowns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("title", &self.title)
            .field("pending_teardowns", &self.pending_teardowns())
            .finish_non_exhaustive()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let failures = self.run_teardowns();
        if failures.is_empty() || std::thread::panicking() {
            return;
        }
        let messages: Vec<String> = failures.iter().map(ToString::to_string).collect();
        panic!(
            "teardown failed for test '{}': {}",
            self.title,
            messages.join("; ")
        );
    }
}
