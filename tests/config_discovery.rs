//! Config Discovery Tests
//!
//! Exercises `EngineConfig::try_load` through `PETROFLOW_CONFIG`. Kept in
//! its own test binary because it mutates the process environment.

use petroflow::config::{ConfigError, EngineConfig};

const CONFIG_ENV_VAR: &str = "PETROFLOW_CONFIG";

#[test]
fn env_config_is_loaded_or_rejected_never_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");

    // Out-of-range base pressure must surface, not fall back to defaults
    let invalid = dir.path().join("invalid.toml");
    std::fs::write(&invalid, "[standard_conditions]\npressure_psia = 0.0\n").expect("write");
    std::env::set_var(CONFIG_ENV_VAR, &invalid);
    assert!(matches!(EngineConfig::try_load(), Err(ConfigError::Validation(_))));

    // Unparseable file
    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[rounding\ndecimals = 3\n").expect("write");
    std::env::set_var(CONFIG_ENV_VAR, &broken);
    assert!(matches!(EngineConfig::try_load(), Err(ConfigError::Parse(..))));

    // Pointing at a file that does not exist
    std::env::set_var(CONFIG_ENV_VAR, dir.path().join("absent.toml"));
    assert!(matches!(EngineConfig::try_load(), Err(ConfigError::Io(..))));

    let valid = dir.path().join("valid.toml");
    std::fs::write(&valid, "[rounding]\ndecimals = 3\n").expect("write");
    std::env::set_var(CONFIG_ENV_VAR, &valid);
    let config = EngineConfig::try_load().expect("valid config loads");
    assert_eq!(config.rounding.decimals, 3);

    std::env::remove_var(CONFIG_ENV_VAR);
}
