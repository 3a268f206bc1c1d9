// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the process runner.
//!
//! Drives real child processes end to end:
//! - A server reachable while the test runs and gone after teardown
//! - Configured wait budget and teardown signal
//! - Event streams consumed through `futures`

#![cfg(unix)]

use futures_util::StreamExt;
use regex::Regex;
use std::time::Duration;
use testbed_rs::config::TestbedConfig;
use testbed_rs::error::{ProcessError, TestbedError};
use testbed_rs::http::http_get;
use testbed_rs::lifecycle::TestContext;
use testbed_rs::logging::{LogLevel, init_test_logging};
use testbed_rs::process::{Channels, ProcessSpec, ProgramEvent, run_process};
use testbed_rs::tempdir::use_temporary_directory;

// =============================================================================
// Server scenario
// =============================================================================

#[tokio::test]
async fn server_is_reachable_until_teardown() {
    if !ProcessSpec::exists("python3") {
        eprintln!("python3 not found; skipping");
        return;
    }
    init_test_logging(LogLevel::DEBUG);

    let t = TestContext::new("server scenario");
    let site = use_temporary_directory(&t).unwrap();
    site.write_file("index.html", "<h1>Hello World!</h1>").unwrap();

    let server = run_process(
        &t,
        ProcessSpec::from_command(["python3", "-u", "-m", "http.server", "0", "--bind", "127.0.0.1"])
            .cwd(site.path())
            .name("http.server"),
    );

    let listening = Regex::new(r"port (\d+) ").unwrap();
    server
        .wait_for_output_timeout(&listening, Duration::from_secs(10))
        .await
        .unwrap();
    let output = server.output();
    let port = &listening.captures(&output).unwrap()[1];
    let url = format!("http://127.0.0.1:{port}/");

    let body = http_get(&url).await.unwrap();
    assert!(body.contains("Hello World!"), "{body}");

    t.finish().unwrap();
    server.wait_until_exit().await.unwrap();

    match http_get(&url).await.unwrap_err() {
        TestbedError::Network(_) => {}
        other => panic!("expected connection failure, got {other:?}"),
    }
    assert!(!site.path().exists());
}

// =============================================================================
// Configuration flows into the runner
// =============================================================================

#[tokio::test]
async fn configured_wait_budget_and_signal() {
    let config = TestbedConfig::parse(
        r#"
[process]
wait_timeout_ms = 150
teardown_signal = "SIGKILL"
"#,
    )
    .unwrap();
    let t = TestContext::with_config("configured runner", config);

    let program = run_process(&t, ProcessSpec::raw("sleep 30"));
    let err = program.wait_for_output("never").await.unwrap_err();
    assert!(
        matches!(err, ProcessError::Timeout { timeout_ms: 150, .. }),
        "{err}"
    );

    t.finish().unwrap();
    assert_eq!(program.wait_until_exit().await.unwrap(), 128 + 9);
}

// =============================================================================
// Event streams
// =============================================================================

#[tokio::test]
async fn event_stream_ends_with_exit() {
    let t = TestContext::new("event stream");
    let program = run_process(
        &t,
        ProcessSpec::raw("for i in 1 2 3; do echo line $i; done; echo warn >&2; exit 2"),
    );

    let events: Vec<ProgramEvent> = program
        .subscribe(Channels::OUTPUT | Channels::EXIT)
        .into_stream()
        .collect()
        .await;

    let text: String = events
        .iter()
        .filter_map(|event| match event {
            ProgramEvent::Output(chunk) => Some(chunk.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(text, program.output());
    assert!(text.contains("line 3\n"));
    assert!(text.contains("warn\n"));
    assert!(matches!(events.last(), Some(ProgramEvent::Exit(2))));
}

#[tokio::test]
async fn spawn_failure_leaves_nothing_to_tear_down() {
    let t = TestContext::new("spawn failure");
    let program = run_process(&t, ProcessSpec::from_command(["nonexistent_program_12345", "--flag"]));

    let err = program.wait_until_exit().await.unwrap_err();
    insta::assert_snapshot!(
        err.to_string().split(':').next().unwrap_or_default(),
        @"failed to spawn process 'nonexistent_program_12345 --flag'"
    );
    assert!(program.subscribe(Channels::all()).recv().await.is_none());
    t.finish().unwrap();
}
