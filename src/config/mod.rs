//! Engine Configuration Module
//!
//! Provides operator-tunable settings loaded from TOML: standard reference
//! conditions, output rounding, allocation policy and storage location.
//!
//! ## Loading Order
//!
//! 1. `PETROFLOW_CONFIG` environment variable (path to TOML file)
//! 2. `petroflow.toml` in the current working directory
//! 3. Built-in defaults (60 °F, 14.7 psia, 2 decimals)
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(EngineConfig::try_load()?);
//!
//! // Anywhere in the codebase:
//! let base = config::get().standard_conditions.temperature_f;
//! ```

mod engine_config;
pub mod defaults;
pub mod validation;

pub use engine_config::*;

use std::sync::OnceLock;

/// Global engine configuration, initialized once at startup.
static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Initialize the global engine configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: EngineConfig) {
    if ENGINE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global engine configuration.
///
/// Falls back to built-in defaults when `init()` has not been called, so
/// library callers that never load a file still get standard conditions.
pub fn get() -> &'static EngineConfig {
    ENGINE_CONFIG.get_or_init(EngineConfig::default)
}
