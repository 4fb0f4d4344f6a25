//! System-wide default constants.
//!
//! Reference conditions and engine defaults, grouped by subsystem.

// ============================================================================
// Standard Conditions
// ============================================================================

/// Standard (base) temperature for volume reporting (°F).
pub const STANDARD_TEMPERATURE_F: f64 = 60.0;

/// Standard (base) pressure for gas reporting (psia).
pub const STANDARD_PRESSURE_PSIA: f64 = 14.7;

/// Offset from °F to °R.
pub const RANKINE_OFFSET: f64 = 459.67;

/// Hours in a production day.
pub const HOURS_PER_DAY: f64 = 24.0;

// ============================================================================
// Rounding
// ============================================================================

/// Decimal places on every standardized output.
pub const DEFAULT_DECIMALS: u32 = 2;

/// Upper bound on configurable decimals. Beyond this f64 scaling loses precision.
pub const MAX_DECIMALS: u32 = 8;

// ============================================================================
// Allocation
// ============================================================================

/// Maximum well-test lookups in flight during one test_based allocation.
pub const DEFAULT_LOOKUP_CONCURRENCY: usize = 8;

// ============================================================================
// Advanced Correction (API MPMS 11.1, 1980 crude oil tables)
// ============================================================================

/// K0 constant for generalized crude oil (kg²/m⁶/°F scale).
pub const VCF_K0_CRUDE: f64 = 341.0957;

/// K1 constant for generalized crude oil.
pub const VCF_K1_CRUDE: f64 = 0.0;

/// Density of water at 60 °F (kg/m³).
pub const WATER_DENSITY_60F_KG_M3: f64 = 999.016;

/// Shrinkage applied when a reading carries none (no shrinkage).
pub const DEFAULT_SHRINKAGE_FACTOR: f64 = 1.0;

// ============================================================================
// Files
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PETROFLOW_CONFIG";

/// Config file searched for in the working directory.
pub const CONFIG_FILE_NAME: &str = "petroflow.toml";

/// Default directory for the sled database.
pub const DEFAULT_DATA_DIR: &str = "./data";
