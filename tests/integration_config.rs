// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for configuration loading.
//!
//! Layered TOML files feeding a test context.

use std::time::Duration;
use testbed_rs::config::TestbedConfig;
use testbed_rs::lifecycle::TestContext;
use testbed_rs::logging::LogLevel;

// =============================================================================
// Layered files
// =============================================================================

#[test]
fn config_later_files_override_earlier_ones() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("testbed.toml");
    let local = dir.path().join("testbed.local.toml");
    std::fs::write(
        &base,
        r#"
[log]
level = 1

[process]
wait_timeout_ms = 5000
teardown_signal = "SIGINT"
"#,
    )
    .unwrap();
    std::fs::write(&local, "[process]\nwait_timeout_ms = 250\n").unwrap();

    let config = TestbedConfig::builder()
        .add_toml_file(&base)
        .add_toml_file_optional(&local)
        .build()
        .unwrap();

    assert_eq!(config.log.level, LogLevel::ERROR);
    assert_eq!(config.process.wait_timeout(), Duration::from_millis(250));
    assert_eq!(config.process.teardown_signal, "SIGINT");
    assert!(config.tempdir.parent.is_none());
}

#[test]
fn config_tempdir_parent_reaches_context() {
    let dir = tempfile::tempdir().unwrap();
    let toml = format!("[tempdir]\nparent = {:?}\n", dir.path().display().to_string());
    let config = TestbedConfig::parse(&toml).unwrap();

    let t = TestContext::with_config("configured tempdir", config);
    let scratch = testbed_rs::tempdir::use_temporary_directory(&t).unwrap();
    assert_eq!(scratch.path().parent(), Some(dir.path()));
    t.finish().unwrap();
}

#[test]
fn config_invalid_file_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("testbed.toml");
    std::fs::write(&path, "[process]\nwait_timeout_ms = \"soon\"\n").unwrap();

    assert!(TestbedConfig::from_file(&path).is_err());
}
