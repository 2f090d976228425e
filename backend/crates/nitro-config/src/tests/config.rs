use crate::tests::{EnvGuard, setup_config_dir};
use crate::{Config, ConfigError};

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok};
use serial_test::serial;

// =========================================================================
// Happy Path Tests
// =========================================================================

#[test]
#[serial]
fn given_no_config_file_when_load_then_ok_with_defaults() {
    // Given
    let _temp = setup_config_dir();

    // When
    let result = Config::load();

    // Then
    assert_that!(result, ok(anything()));
    let config = result.unwrap();
    assert_that!(config.server.port, eq(crate::DEFAULT_PORT));
    assert_that!(config.server.config_file.as_str(), eq("config/config.json"));
    assert_that!(config.timing.port_poll_interval_ms, eq(200_u64));
    assert_that!(config.timing.port_grace_timeout_ms, eq(3_000_u64));
    assert_that!(config.timing.readiness_poll_interval_ms, eq(300_u64));
    assert_that!(config.timing.readiness_timeout_ms, eq(30_000_u64));
    assert!(!config.timing.kill_on_readiness_timeout);
}

#[test]
#[serial]
fn given_defaults_when_validate_then_ok() {
    // Given
    let _temp = setup_config_dir();

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.validate(), ok(anything()));
}

#[test]
#[serial]
fn given_missing_config_dir_when_load_then_directory_created() {
    // Given
    let (temp, _guard) = setup_config_dir();
    let nested = temp.path().join("nested").join("nitro");

    // When
    let result = Config::load_from(&nested);

    // Then
    assert_that!(result, ok(anything()));
    assert!(nested.is_dir());
}

#[test]
#[serial]
fn given_toml_file_when_load_then_uses_file_values() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(
        temp.path().join("supervisor.toml"),
        r#"
            [server]
            port = 4000
            binary_dir = "/opt/nitro"
            binary_name = "nitro_custom"

            [paths]
            user_data_dir = "/srv/models"

            [timing]
            readiness_timeout_ms = 5000
            kill_on_readiness_timeout = true

            [logging]
            level = "debug"
        "#,
    )
    .unwrap();

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(4000_u16));
    assert_eq!(config.server.binary_name.as_deref(), Some("nitro_custom"));
    assert_that!(config.timing.readiness_timeout_ms, eq(5000_u64));
    assert!(config.timing.kill_on_readiness_timeout);
    assert_eq!(config.logging.level.to_string(), "debug");
    assert_eq!(
        config.server_config_path().unwrap(),
        std::path::PathBuf::from("/opt/nitro/config/config.json")
    );
    assert_eq!(
        config.user_data_dir().unwrap(),
        std::path::PathBuf::from("/srv/models")
    );
}

#[test]
#[serial]
fn given_env_overrides_when_load_then_env_wins_over_file() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(
        temp.path().join("supervisor.toml"),
        "[server]\nport = 4000\n",
    )
    .unwrap();
    let _port = EnvGuard::set("NITRO_SERVER_PORT", "4100");
    let _kill = EnvGuard::set("NITRO_KILL_ON_READINESS_TIMEOUT", "1");
    let _data = EnvGuard::set("NITRO_USER_DATA_DIR", "/data/models");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(4100_u16));
    assert!(config.timing.kill_on_readiness_timeout);
    assert_eq!(config.paths.user_data_dir.as_deref(), Some("/data/models"));
}

#[test]
#[serial]
fn given_unparseable_env_number_when_load_then_keeps_default() {
    // Given
    let _temp = setup_config_dir();
    let _port = EnvGuard::set("NITRO_SERVER_PORT", "not-a-port");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(crate::DEFAULT_PORT));
}

// =========================================================================
// Error Tests
// =========================================================================

#[test]
#[serial]
fn given_invalid_toml_when_load_then_toml_error() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(temp.path().join("supervisor.toml"), "[server\nport = ").unwrap();

    // When
    let result = Config::load();

    // Then
    assert!(matches!(result, Err(ConfigError::Toml { .. })));
}

#[test]
#[serial]
fn given_relative_user_data_dir_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _data = EnvGuard::set("NITRO_USER_DATA_DIR", "models");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.validate(), err(anything()));
}

#[test]
#[serial]
fn given_relative_binary_dir_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _bin = EnvGuard::set("NITRO_BINARY_DIR", "bin/nitro");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.validate(), err(anything()));
}

#[test]
#[serial]
fn given_no_binary_dir_when_binary_dir_then_defaults_next_to_executable() {
    // Given
    let _temp = setup_config_dir();

    // When
    let config = Config::load().unwrap();
    let dir = config.binary_dir().unwrap();

    // Then
    let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
    assert_eq!(dir, exe_dir.join("nitro"));
}
