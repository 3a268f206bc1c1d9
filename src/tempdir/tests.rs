// testbed-rs: Test Support Helpers
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::*;
use crate::config::TestbedConfig;
use crate::error::FsError;

#[test]
fn test_normalize_contents_dedents_and_trims() {
    let text = normalize_contents(
        "
        Hello World!
    ",
    );
    assert_eq!(text, "Hello World!\n");
}

#[test]
fn test_normalize_contents_keeps_relative_indentation() {
    let text = normalize_contents(
        "
        #!/bin/sh
        if true; then
          echo yes
        fi
        ",
    );
    assert_eq!(text, "#!/bin/sh\nif true; then\n  echo yes\nfi\n");
}

#[test]
fn test_normalize_contents_plain_text() {
    assert_eq!(normalize_contents("Hello World!"), "Hello World!\n");
    assert_eq!(normalize_contents(""), "\n");
}

#[test]
fn test_directory_is_created_and_removed() {
    let t = TestContext::new("tempdir lifecycle");
    let dir = use_temporary_directory(&t).unwrap();
    let path = dir.path().to_path_buf();

    assert!(path.is_dir());
    assert!(
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with(PREFIX))
    );
    assert_eq!(t.pending_teardowns(), 1);

    dir.write_file("nested/file.txt", "data").unwrap();
    t.finish().unwrap();
    assert!(!path.exists());
}

#[test]
fn test_already_removed_directory_is_not_a_teardown_error() {
    let t = TestContext::new("removed early");
    let dir = use_temporary_directory(&t).unwrap();
    std::fs::remove_dir_all(dir.path()).unwrap();
    t.finish().unwrap();
}

#[test]
fn test_write_file_creates_subdirectories() {
    let t = TestContext::new("subdirectories");
    let dir = use_temporary_directory(&t).unwrap();

    let written = dir
        .write_file(
            "folder/file.txt",
            "
            Hello World!
            ",
        )
        .unwrap();

    assert_eq!(written, dir.path().join("folder").join("file.txt"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("folder/file.txt")).unwrap(),
        "Hello World!\n"
    );
}

#[test]
fn test_write_file_rejects_escaping_paths() {
    let t = TestContext::new("escaping paths");
    let dir = use_temporary_directory(&t).unwrap();

    for bad in ["../outside.txt", "a/../../outside.txt", "/etc/passwd", ""] {
        let err = dir.write_file(bad, "x").unwrap_err();
        assert!(
            matches!(err.downcast_ref::<FsError>(), Some(FsError::InvalidPath { .. })),
            "{bad}: {err}"
        );
    }
}

#[cfg(unix)]
#[test]
fn test_shebang_files_are_executable() {
    use std::os::unix::fs::PermissionsExt;

    let t = TestContext::new("executable");
    let dir = use_temporary_directory(&t).unwrap();

    let script = dir
        .write_file(
            "bin.sh",
            "
            #!/bin/sh
            echo 'Hello World!'
            ",
        )
        .unwrap();
    let plain = dir.write_file("notes.txt", "not a script").unwrap();

    let mode = |path: &Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&script), 0o755);
    assert_ne!(mode(&plain) & 0o111, 0o111);
}

#[test]
fn test_parent_from_config_and_explicit_parent() {
    let scratch = tempfile::tempdir().unwrap();

    let mut config = TestbedConfig::default();
    config.tempdir.parent = Some(scratch.path().to_path_buf());
    let t = TestContext::with_config("configured parent", config);

    let from_config = use_temporary_directory(&t).unwrap();
    assert_eq!(from_config.path().parent(), Some(scratch.path()));

    let explicit = use_temporary_directory_in(&t, scratch.path()).unwrap();
    assert_eq!(explicit.path().parent(), Some(scratch.path()));
    assert_ne!(explicit.path(), from_config.path());

    t.finish().unwrap();
    assert!(!from_config.path().exists());
    assert!(!explicit.path().exists());
}

#[test]
fn test_missing_parent_is_an_error() {
    let t = TestContext::new("missing parent");
    let result = use_temporary_directory_in(&t, "/nonexistent/parent/12345");
    assert!(result.is_err());
    assert_eq!(t.pending_teardowns(), 0);
}
