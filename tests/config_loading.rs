// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use runvisor::config::{load_and_validate, load_from_path, load_from_str};
use runvisor::errors::RunvisorError;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_minimal_config_gets_server_defaults() {
    let file = write_config(
        r#"
[pipeline.build]
cmd = "make"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.server.port, 50051);
    assert_eq!(cfg.server.max_workers, 10);
    assert_eq!(cfg.server.poll_interval(), Duration::from_secs(1));
    assert_eq!(cfg.pipeline["build"].cmd, "make");
    assert!(cfg.pipeline["build"].env.is_empty());
}

#[test]
fn test_full_config_round_trips_every_field() {
    let cfg = load_from_str(
        r#"
[server]
host = "0.0.0.0"
port = 6000
max_workers = 3
poll_interval_ms = 250

[pipeline.__default__]
cmd = "echo default"

[pipeline.train]
cmd = "python train.py"
cwd = "/srv/models"
description = "nightly training"

[pipeline.train.env]
EPOCHS = "4"
"#,
    )
    .unwrap();

    assert_eq!(cfg.server.port, 6000);
    assert_eq!(cfg.server.max_workers, 3);
    assert_eq!(cfg.server.poll_interval(), Duration::from_millis(250));
    assert_eq!(cfg.server.socket_addr().unwrap().to_string(), "0.0.0.0:6000");

    let train = &cfg.pipeline["train"];
    assert_eq!(train.cwd, Some(PathBuf::from("/srv/models")));
    assert_eq!(train.description.as_deref(), Some("nightly training"));
    assert_eq!(train.env.get("EPOCHS").map(String::as_str), Some("4"));
    assert!(cfg.pipeline.contains_key("__default__"));
}

#[test]
fn test_config_without_pipelines_is_rejected() {
    let result = load_from_str(
        r#"
[server]
port = 7000
"#,
    );

    match result {
        Err(RunvisorError::ConfigError(msg)) => assert!(msg.contains("at least one")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_empty_cmd_is_rejected() {
    let result = load_from_str(
        r#"
[pipeline.broken]
cmd = "   "
"#,
    );

    match result {
        Err(RunvisorError::ConfigError(msg)) => {
            assert!(msg.contains("broken"));
            assert!(msg.contains("empty"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_zero_max_workers_is_rejected() {
    let result = load_from_str(
        r#"
[server]
max_workers = 0

[pipeline.a]
cmd = "true"
"#,
    );

    assert!(matches!(result, Err(RunvisorError::ConfigError(_))));
}

#[test]
fn test_invalid_host_is_rejected() {
    let result = load_from_str(
        r#"
[server]
host = "not an address"

[pipeline.a]
cmd = "true"
"#,
    );

    match result {
        Err(RunvisorError::ConfigError(msg)) => assert!(msg.contains("not an address")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_malformed_toml_is_a_toml_error() {
    let file = write_config("[pipeline.a\ncmd = ");

    assert!(matches!(
        load_from_path(file.path()),
        Err(RunvisorError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Runvisor.toml");

    assert!(matches!(
        load_and_validate(&missing),
        Err(RunvisorError::IoError(_))
    ));
}
