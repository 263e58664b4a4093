//! Configuration loading from files and the environment.

use std::io::Write;

use bookkeeping_api::{BkpClientFactory, BkpConfig};
use serial_test::serial;
use tempfile::NamedTempFile;
use tracing_test::traced_test;

const ENV_URI: &str = "BKP_O2__BKP__GRPC_URI";
const ENV_TOKEN: &str = "BKP_O2__BKP__TOKEN";
const ENV_TIMEOUT: &str = "BKP_CHANNEL__REQUEST_TIMEOUT_MS";

fn clear_env() {
    for key in [ENV_URI, ENV_TOKEN, ENV_TIMEOUT, "BKP_LOG_LEVEL"] {
        std::env::remove_var(key);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn file_values_are_loaded() {
    clear_env();
    let file = config_file(
        r#"
        log_level = "debug"

        [o2.bkp]
        grpc-uri = "ali-bookkeeping:4001"
        token = "file-token"

        [channel]
        request_timeout_ms = 5000
        "#,
    );

    let config = BkpConfig::load_from(file.path()).unwrap();

    assert_eq!(config.grpc_uri(), Some("ali-bookkeeping:4001"));
    assert_eq!(config.token(), Some("file-token"));
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.channel.request_timeout_ms, 5000);
    assert_eq!(config.channel.connect_timeout_ms, 10_000);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn legacy_endpoint_key_is_read() {
    clear_env();
    let file = config_file(
        r#"
        [o2.bookkeeping]
        grpc-url = "legacy-host:4001"
        "#,
    );

    let config = BkpConfig::load_from(file.path()).unwrap();

    assert_eq!(config.grpc_uri(), Some("legacy-host:4001"));
}

#[test]
#[serial]
fn environment_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
        [o2.bkp]
        grpc-uri = "file-host:4001"
        "#,
    );
    std::env::set_var(ENV_URI, "env-host:4001");
    std::env::set_var(ENV_TIMEOUT, "750");

    let config = BkpConfig::load_from(file.path());
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.grpc_uri(), Some("env-host:4001"));
    assert_eq!(config.channel.request_timeout_ms, 750);
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();

    let config = BkpConfig::load_from(dir.path().join("absent.toml")).unwrap();

    assert_eq!(config, BkpConfig::default());
}

#[test]
#[serial]
fn malformed_file_is_a_config_error() {
    clear_env();
    let file = config_file("[channel]\nrequest_timeout_ms = \"soon\"\n");

    let err = BkpConfig::load_from(file.path()).unwrap_err();

    assert!(matches!(err, bookkeeping_api::ClientError::Config(_)));
}

#[tokio::test]
#[serial]
async fn client_is_built_from_configuration() {
    clear_env();
    let file = config_file(
        r#"
        [o2.bkp]
        grpc-uri = "127.0.0.1:4001"
        token = "t"
        "#,
    );
    let config = BkpConfig::load_from(file.path()).unwrap();

    assert!(BkpClientFactory::from_config(&config).is_ok());
}

#[test]
#[serial]
fn empty_env_endpoint_falls_back_to_legacy_key() {
    clear_env();
    std::env::set_var(ENV_URI, "");
    let file = config_file(
        r#"
        [o2.bookkeeping]
        grpc-url = "legacy.local:4001"
        "#,
    );

    let config = BkpConfig::load_from(file.path()).unwrap();
    clear_env();

    assert_eq!(config.grpc_uri(), Some("legacy.local:4001"));
}

#[tokio::test]
#[serial]
#[traced_test]
async fn configured_endpoint_is_logged_as_configuration() {
    clear_env();
    let file = config_file(
        r#"
        [o2.bkp]
        grpc-uri = "127.0.0.1:4001"
        "#,
    );
    let config = BkpConfig::load_from(file.path()).unwrap();

    assert!(BkpClientFactory::from_config(&config).is_ok());
    assert!(logs_contain("source=Configuration"));
    assert!(!logs_contain("source=Explicit"));
}
