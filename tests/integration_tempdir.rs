// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for temporary directories.
//!
//! Scripts written into a scratch directory and run as processes, with
//! both cleaned up by the same test context.

#![cfg(unix)]

use testbed_rs::lifecycle::TestContext;
use testbed_rs::process::{ProcessSpec, run_process};
use testbed_rs::tempdir::use_temporary_directory;

#[tokio::test]
async fn written_script_runs_in_its_directory() {
    let t = TestContext::new("script in tempdir");
    let dir = use_temporary_directory(&t).unwrap();

    let script = dir
        .write_file(
            "bin/greet",
            r#"
            #!/bin/sh
            cat message.txt
            echo "from $(basename "$(pwd)")"
            "#,
        )
        .unwrap();
    dir.write_file(
        "message.txt",
        "
            Hello World!
        ",
    )
    .unwrap();

    let program = run_process(&t, ProcessSpec::new(script.to_string_lossy()).cwd(dir.path()));
    assert_eq!(program.wait_until_exit().await.unwrap(), 0);

    let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(program.output(), format!("Hello World!\nfrom {name}\n"));

    let path = dir.path().to_path_buf();
    t.finish().unwrap();
    assert!(!path.exists());
}

#[test]
fn directory_is_removed_when_context_drops() {
    let path = {
        let t = TestContext::new("dropped context");
        let dir = use_temporary_directory(&t).unwrap();
        dir.write_file("file.txt", "data").unwrap();
        dir.path().to_path_buf()
    };
    assert!(!path.exists());
}
