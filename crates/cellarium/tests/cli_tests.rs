// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the built binary against config files in a temp directory.

use std::path::Path;
use std::process::{Command, Output};

fn cellarium(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cellarium"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("binary should run")
}

#[test]
fn help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let out = cellarium(dir.path(), &["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    for command in ["login", "wines", "bought", "drank", "add", "undo-consume", "store-add"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn invalid_config_exits_with_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[api]\nbase_ulr = \"http://localhost:8000\"\n").unwrap();

    let out = cellarium(dir.path(), &["--config", config.to_str().unwrap(), "stores"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("base_ulr"), "stderr: {stderr}");
    assert!(stderr.contains("base_url"), "stderr: {stderr}");
}

#[test]
fn failed_validation_reports_every_problem() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(
        &config,
        "[api]\nbase_url = \"ftp://example\"\n[search]\nmax_results = 0\n",
    )
    .unwrap();

    let out = cellarium(dir.path(), &["--config", config.to_str().unwrap(), "wines"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("base_url"), "stderr: {stderr}");
    assert!(stderr.contains("max_results"), "stderr: {stderr}");
}

#[test]
fn unreachable_backend_is_a_network_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("cellarium.toml");
    let tokens = dir.path().join("tokens.json");
    std::fs::write(
        &config,
        format!(
            "[api]\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n[auth]\ntoken_path = {:?}\n",
            tokens.display().to_string()
        ),
    )
    .unwrap();

    let out = cellarium(dir.path(), &["--config", config.to_str().unwrap(), "stores"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("network error"), "stderr: {stderr}");
}
