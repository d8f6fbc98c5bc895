use std::env;
use std::fs::write;

use serial_test::serial;
use tempfile::NamedTempFile;

/// This test ensures that a static config plus required env vars produces a
/// fully merged CliConfig.
#[tokio::test]
#[serial]
async fn test_load_config_success_injects_env_credentials() {
    let config_yaml = r#"
destination:
  url: "https://company.sharepoint.com/sites/mysite/Shared Documents"
transfer:
  chunk_size_mib: 8
  verbose: true
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    env::set_var("SP_AUTH_HEADER", "Bearer top-secret-test-token");
    env::remove_var("SP_AUTH_COOKIE");

    let config = sp_upload::load_config::load_config(config_file.path())
        .expect("Config should load");

    assert_eq!(
        config.url,
        "https://company.sharepoint.com/sites/mysite/Shared Documents"
    );
    assert_eq!(config.max_chunk_size, 8 * 1024 * 1024);
    assert!(config.verbose);

    // Auth material must come directly from environment
    assert_eq!(
        config.credentials.headers.get("Authorization").map(String::as_str),
        Some("Bearer top-secret-test-token")
    );
    assert!(!config.credentials.headers.contains_key("Cookie"));
}

/// Chunk size falls back to the 16 MiB default when the config omits it.
#[tokio::test]
#[serial]
async fn test_load_config_defaults_chunk_size() {
    let config_yaml = r#"
destination:
  url: "https://company.sharepoint.com/sites/mysite/Docs"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    env::set_var("SP_AUTH_COOKIE", "FedAuth=abc; rtFa=def");
    env::remove_var("SP_AUTH_HEADER");

    let config = sp_upload::load_config::load_config(config_file.path())
        .expect("Config should load");

    assert_eq!(config.max_chunk_size, 16 * 1024 * 1024);
    assert!(!config.verbose);
    assert_eq!(
        config.credentials.headers.get("Cookie").map(String::as_str),
        Some("FedAuth=abc; rtFa=def")
    );
}

/// This test ensures that missing auth env vars makes the loader fail.
#[tokio::test]
#[serial]
async fn test_load_config_errors_on_missing_env() {
    let config_yaml = r#"
destination:
  url: "https://company.sharepoint.com/sites/mysite/Docs"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    env::remove_var("SP_AUTH_HEADER");
    env::remove_var("SP_AUTH_COOKIE");

    let err = sp_upload::load_config::load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();

    assert!(
        msg.contains("SP_AUTH_HEADER") && msg.contains("SP_AUTH_COOKIE"),
        "Must name the missing env vars, got: {msg}"
    );
}

/// This test ensures that if the config file is not valid YAML, load_config
/// errors and reports as such.
#[tokio::test]
#[serial]
async fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    env::set_var("SP_AUTH_HEADER", "Bearer whatever");

    let err = sp_upload::load_config::load_config(config_file.path()).unwrap_err();
    assert!(
        err.to_string().contains("parse config YAML"),
        "Must report a YAML parse failure, got: {err}"
    );
}

/// A zero chunk size is rejected rather than producing an unusable source.
#[tokio::test]
#[serial]
async fn test_load_config_rejects_zero_chunk_size() {
    let config_yaml = r#"
destination:
  url: "https://company.sharepoint.com/sites/mysite/Docs"
transfer:
  chunk_size_mib: 0
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    env::set_var("SP_AUTH_HEADER", "Bearer whatever");

    let err = sp_upload::load_config::load_config(config_file.path()).unwrap_err();
    assert!(
        err.to_string().contains("chunk_size_mib"),
        "Must reject a zero chunk size, got: {err}"
    );
}
