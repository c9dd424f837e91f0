//! Configuration loading integration tests.

use athena_query_runner::config::Config;
use athena_query_runner::error::RunnerError;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_load_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[service]
endpoint = "http://127.0.0.1:4566"

[query]
database = "web_logs"
catalog = "LakeCatalog"
row_limit = 200
timeout_secs = 45
poll_interval_ms = 250
max_page_size = 500
"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();

    assert_eq!(
        config.service.endpoint_url().unwrap().as_str(),
        "http://127.0.0.1:4566/"
    );

    let request = config.query.submit_request("SELECT 1").unwrap();
    assert_eq!(request.database, "web_logs");
    assert_eq!(request.catalog, "LakeCatalog");
    assert_eq!(request.workgroup, "primary");

    let options = config.query.run_options().unwrap();
    assert_eq!(options.row_limit, 200);
    assert_eq!(options.timeout, Duration::from_secs(45));
    assert_eq!(options.poll_interval, Duration::from_millis(250));
    assert_eq!(options.max_page_size, 500);
}

#[test]
fn test_load_invalid_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[query]\nrow_limit = \"many\"\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, RunnerError::Config(_)));
}

#[test]
fn test_missing_database_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[query]\nrow_limit = 10\n").unwrap();

    let config = Config::load_from_file(&path).unwrap();
    let err = config.query.run_options().unwrap_err();
    assert_eq!(err.category(), "Configuration Error");
}
