use std::fs::write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

/// Creates a minimal config file for the CLI to read.
fn create_minimal_config() -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        config.path(),
        b"destination:\n  url: \"https://company.sharepoint.com/sites/mysite/Docs\"\ntransfer:\n  chunk_size_mib: 1\n",
    )
    .expect("Writing temp config failed");
    config
}

#[test]
fn upload_cli_requires_config_and_file_arguments() {
    let mut cmd = Command::cargo_bin("sp-upload").expect("Binary exists");
    cmd.arg("upload");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--config").and(predicate::str::contains("--file")));
}

#[test]
fn upload_cli_fails_cleanly_when_config_file_is_missing() {
    let source = NamedTempFile::new().expect("temp source file");

    let mut cmd = Command::cargo_bin("sp-upload").expect("Binary exists");
    cmd.arg("upload")
        .arg("--config")
        .arg("/definitely/not/a/config.yaml")
        .arg("--file")
        .arg(source.path())
        .env("SP_AUTH_HEADER", "Bearer test-token");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn upload_cli_fails_cleanly_without_auth_env() {
    let config = create_minimal_config();
    let source = NamedTempFile::new().expect("temp source file");

    let mut cmd = Command::cargo_bin("sp-upload").expect("Binary exists");
    cmd.arg("upload")
        .arg("--config")
        .arg(config.path())
        .arg("--file")
        .arg(source.path())
        .env_remove("SP_AUTH_HEADER")
        .env_remove("SP_AUTH_COOKIE");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("SP_AUTH_HEADER"));
}
