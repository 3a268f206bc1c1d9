// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{
    ConfigError, FsError, NetworkError, ProcessError, TeardownError, TestbedError, TestbedResult,
};

#[test]
fn test_config_error_display() {
    let err = ConfigError::InvalidValue {
        section: "process".to_string(),
        key: "wait_timeout_ms".to_string(),
        message: "must be greater than zero".to_string(),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'wait_timeout_ms' in section '[process]': must be greater than zero"
    );
}

#[test]
fn test_timeout_error_includes_output() {
    let err = ProcessError::Timeout {
        pattern: "\"Listening\"".to_string(),
        timeout_ms: 1000,
        output: "starting".to_string(),
    };
    assert_eq!(err.output(), Some("starting"));
    insta::assert_snapshot!(err.to_string(), @r#"
    Timeout exceeded after 1000ms without seeing expected output "Listening":
    starting
    "#);
}

#[test]
fn test_premature_exit_error_includes_output() {
    let err = ProcessError::PrematureExit {
        pattern: "/ready/".to_string(),
        code: 3,
        output: "boom".to_string(),
    };
    assert_eq!(err.output(), Some("boom"));
    assert!(err.to_string().contains("code 3"));
    assert!(err.to_string().ends_with("boom"));
}

#[test]
fn test_boxed_conversion() {
    let err: TestbedError = ProcessError::ExitLost {
        command: "sleep".to_string(),
    }
    .into();
    assert!(matches!(err, TestbedError::Process(_)));
}

fn variant(err: &TestbedError) -> &'static str {
    match err {
        TestbedError::Process(_) => "process",
        TestbedError::Teardown(_) => "teardown",
        TestbedError::Config(_) => "config",
        TestbedError::Fs(_) => "fs",
        TestbedError::Network(_) => "network",
        TestbedError::Io(_) => "io",
    }
}

#[test]
fn test_every_variant_has_a_source_conversion() {
    let errors: Vec<TestbedError> = vec![
        ProcessError::ExitLost {
            command: "sleep".to_string(),
        }
        .into(),
        TeardownError::Failed {
            name: "remove dir".to_string(),
            message: "busy".to_string(),
        }
        .into(),
        ConfigError::ParseError {
            path: "testbed.toml".to_string(),
            message: "bad".to_string(),
        }
        .into(),
        FsError::InvalidPath {
            path: "../x".to_string(),
            root: "/tmp/t".to_string(),
        }
        .into(),
        NetworkError::InvalidMethod("BREW".to_string()).into(),
        std::io::Error::other("disk gone").into(),
    ];
    let names: Vec<&str> = errors.iter().map(variant).collect();
    assert_eq!(
        names,
        ["process", "teardown", "config", "fs", "network", "io"]
    );
    insta::assert_snapshot!(
        errors[5].to_string(),
        @"io error: disk gone"
    );
}

#[test]
fn test_testbed_error_size() {
    let size = std::mem::size_of::<TestbedError>();
    assert!(size <= 24, "TestbedError is {size} bytes, expected <= 24");
}

#[test]
fn test_testbed_result_size() {
    let size = std::mem::size_of::<TestbedResult<()>>();
    assert!(size <= 24, "TestbedResult<()> is {size} bytes, expected <= 24");
}
