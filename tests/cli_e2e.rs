//! End-to-end CLI tests for the sku-images binary.

#![allow(deprecated)]

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use support::{file_names, mount_body, mount_status, png_bytes};

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("sku-images").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch download product images"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("sku-images").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sku-images"));
}

/// Test that a missing input argument is a usage error.
#[test]
fn test_binary_without_input_fails() {
    let mut cmd = Command::cargo_bin("sku-images").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("INPUT"));
}

/// Test that an unreadable input file aborts with a non-zero exit.
#[test]
fn test_binary_missing_input_file_fails() {
    let tempdir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("sku-images").unwrap();
    cmd.current_dir(tempdir.path())
        .env("XDG_CONFIG_HOME", tempdir.path().join("xdg-config"))
        .arg("does_not_exist.csv")
        .assert()
        .failure();
    assert!(!tempdir.path().join("error_log.csv").exists());
}

/// Test that an input without the `image_url` column aborts before any row runs.
#[test]
fn test_binary_missing_column_fails() {
    let tempdir = TempDir::new().unwrap();
    std::fs::write(tempdir.path().join("bad.csv"), "sku;url\nA;https://x/a.png\n").unwrap();

    let mut cmd = Command::cargo_bin("sku-images").unwrap();
    cmd.current_dir(tempdir.path())
        .env("XDG_CONFIG_HOME", tempdir.path().join("xdg-config"))
        .arg("bad.csv")
        .assert()
        .failure();
}

/// Full run: one good row, one 404 row. The run still succeeds and the
/// failed row lands in error_log.csv in the working directory.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_run_writes_images_and_error_log() {
    let server = wiremock::MockServer::start().await;
    let body = png_bytes([12, 34, 56]);
    mount_body(&server, "/good.png", 200, body.clone()).await;
    mount_status(&server, "/bad.png", 404).await;

    let tempdir = TempDir::new().unwrap();
    let out = tempdir.path().join("images").join("no_variantes");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(
        tempdir.path().join("no_variantes.csv"),
        format!(
            "sku;image_url\nGOOD;{uri}/good.png\nBAD;{uri}/bad.png\n",
            uri = server.uri()
        ),
    )
    .unwrap();

    let workdir = tempdir.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("sku-images")
            .unwrap()
            .current_dir(&workdir)
            .env("XDG_CONFIG_HOME", workdir.join("xdg-config"))
            .arg("no_variantes.csv")
            .assert()
            .success()
            .get_output()
            .clone()
    })
    .await
    .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("image download finished"),
        "expected completion message in: {stdout}"
    );

    assert_eq!(file_names(&out), ["GOOD_1.png"]);
    assert_eq!(std::fs::read(out.join("GOOD_1.png")).unwrap(), body);

    let log = std::fs::read_to_string(tempdir.path().join("error_log.csv")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "sku;image_url;error_message");
    assert!(lines[1].starts_with("BAD;"));
}

/// A config file supplies the output root; the batch flag picks the folder.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_reads_config_file() {
    let server = wiremock::MockServer::start().await;
    mount_body(&server, "/c.png", 200, png_bytes([1, 2, 3])).await;

    let tempdir = TempDir::new().unwrap();
    let config_dir = tempdir.path().join("xdg-config").join("sku-images");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "output_root = \"media\"\nerror_log = \"failures.csv\"\n",
    )
    .unwrap();
    let out = tempdir.path().join("media").join("autumn");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(
        tempdir.path().join("input.csv"),
        format!("sku;image_url\nC;{}/c.png\n", server.uri()),
    )
    .unwrap();

    let workdir = tempdir.path().to_path_buf();
    tokio::task::spawn_blocking(move || {
        Command::cargo_bin("sku-images")
            .unwrap()
            .current_dir(&workdir)
            .env("XDG_CONFIG_HOME", workdir.join("xdg-config"))
            .args(["input.csv", "--batch", "autumn", "-q"])
            .assert()
            .success();
    })
    .await
    .unwrap();

    assert_eq!(file_names(&out), ["C_1.png"]);
    assert!(!tempdir.path().join("failures.csv").exists());
}
