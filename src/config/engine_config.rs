//! Engine Configuration - reference conditions and policies as TOML values
//!
//! Each section implements `Default` with the industry reference values,
//! so a missing or empty config file yields the canonical pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Config Provenance
// ============================================================================

/// Tracks which configuration keys were explicitly present in the user's TOML file.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvenance {
    /// Dotted key paths explicitly present in the user's TOML file
    pub explicit_keys: HashSet<String>,
}

impl ConfigProvenance {
    /// Example: `provenance.is_user_set("standard_conditions.temperature_f")`
    pub fn is_user_set(&self, dotted_key: &str) -> bool {
        self.explicit_keys.contains(dotted_key)
    }
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one facility deployment.
///
/// Load with `EngineConfig::try_load()` which searches:
/// 1. `$PETROFLOW_CONFIG` env var
/// 2. `./petroflow.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Facility identification
    #[serde(default)]
    pub facility: FacilityInfo,

    /// Base conditions volumes are corrected to
    #[serde(default)]
    pub standard_conditions: StandardConditions,

    /// Output rounding
    #[serde(default)]
    pub rounding: RoundingConfig,

    /// Allocation policy
    #[serde(default)]
    pub allocation: AllocationConfig,

    /// Advanced correction pipeline constants
    #[serde(default)]
    pub advanced: AdvancedConfig,

    /// Embedded database location
    #[serde(default)]
    pub storage: StorageConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order.
    ///
    /// A config file that is found but fails to read, parse or validate is
    /// an error; built-in defaults apply only when no file exists.
    pub fn try_load() -> Result<Self, ConfigError> {
        Self::try_load_with_provenance().map(|(config, _provenance)| config)
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let (config, _provenance) = Self::load_from_file_with_provenance(path)?;
        Ok(config)
    }

    /// Load from a specific TOML file path, also returning provenance
    /// so callers can distinguish user-set values from defaults.
    pub fn load_from_file_with_provenance(
        path: &Path,
    ) -> Result<(Self, ConfigProvenance), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents)
            .map_err(|e| match e {
                ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
                other => other,
            })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys only produce warnings; range violations are errors.
    pub fn from_toml_str(contents: &str) -> Result<(Self, ConfigProvenance), ConfigError> {
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let provenance = ConfigProvenance {
            explicit_keys: contents
                .parse::<toml::Value>()
                .map(|value| super::validation::walk_toml_keys(&value, ""))
                .unwrap_or_default()
                .into_iter()
                .collect(),
        };

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok((config, provenance))
    }

    /// Load configuration using standard search order, returning provenance.
    pub fn try_load_with_provenance() -> Result<(Self, ConfigProvenance), ConfigError> {
        let env_path = std::env::var_os(defaults::CONFIG_ENV_VAR).map(PathBuf::from);
        Self::discover(env_path.as_deref(), Path::new(defaults::CONFIG_FILE_NAME))
    }

    /// Search order: explicit env path, then the local file, then defaults.
    fn discover(
        env_path: Option<&Path>,
        local: &Path,
    ) -> Result<(Self, ConfigProvenance), ConfigError> {
        // 1. PETROFLOW_CONFIG must point at a loadable file
        if let Some(path) = env_path {
            let (config, provenance) = Self::load_from_file_with_provenance(path)?;
            info!(path = %path.display(), facility = %config.facility.name, "Loaded engine config from PETROFLOW_CONFIG");
            return Ok((config, provenance));
        }

        // 2. ./petroflow.toml
        if local.exists() {
            let (config, provenance) = Self::load_from_file_with_provenance(local)?;
            info!(path = %local.display(), facility = %config.facility.name, "Loaded engine config");
            return Ok((config, provenance));
        }

        // 3. Defaults
        info!("No petroflow.toml found, using built-in defaults");
        Ok((Self::default(), ConfigProvenance::default()))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Engine config saved");
        Ok(())
    }

    /// Validate all values.
    ///
    /// Range errors come from `validation::validate_physical_ranges`;
    /// suspicious-but-legal values are logged as warnings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_physical_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Facility Info
// ============================================================================

/// Identification metadata. Not used for logic, but appears in logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityInfo {
    /// Facility identifier (used as default for `allocate --facility`)
    #[serde(default = "default_facility_name")]
    pub name: String,

    /// Field name
    #[serde(default)]
    pub field: String,
}

fn default_facility_name() -> String {
    "DEFAULT".to_string()
}

impl Default for FacilityInfo {
    fn default() -> Self {
        Self {
            name: default_facility_name(),
            field: String::new(),
        }
    }
}

// ============================================================================
// Standard Conditions
// ============================================================================

/// Base temperature and pressure that gas volumes are corrected to.
///
/// Also the values assumed when a reading omits temperature or pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardConditions {
    #[serde(default = "default_std_temperature")]
    pub temperature_f: f64,

    #[serde(default = "default_std_pressure")]
    pub pressure_psia: f64,
}

fn default_std_temperature() -> f64 { defaults::STANDARD_TEMPERATURE_F }
fn default_std_pressure() -> f64 { defaults::STANDARD_PRESSURE_PSIA }

impl Default for StandardConditions {
    fn default() -> Self {
        Self {
            temperature_f: default_std_temperature(),
            pressure_psia: default_std_pressure(),
        }
    }
}

impl StandardConditions {
    /// Standard temperature on the Rankine scale.
    pub fn temperature_rankine(&self) -> f64 {
        self.temperature_f + defaults::RANKINE_OFFSET
    }
}

// ============================================================================
// Rounding
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingConfig {
    /// Decimal places on standardized outputs (half-up)
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 { defaults::DEFAULT_DECIMALS }

impl Default for RoundingConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
        }
    }
}

// ============================================================================
// Allocation
// ============================================================================

/// What pro_rata does when every supplied factor is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroFactorPolicy {
    /// Fail with `AllocationError::ZeroFactorSum`
    #[default]
    Reject,
    /// Split the totals equally across all wells
    EqualSplit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationConfig {
    #[serde(default)]
    pub zero_factor_policy: ZeroFactorPolicy,

    /// Well-test lookups in flight at once during test_based allocation
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,
}

fn default_lookup_concurrency() -> usize { defaults::DEFAULT_LOOKUP_CONCURRENCY }

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            zero_factor_policy: ZeroFactorPolicy::default(),
            lookup_concurrency: default_lookup_concurrency(),
        }
    }
}

// ============================================================================
// Advanced Correction
// ============================================================================

/// Constants for the opt-in multi-step correction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// VCF thermal expansion constant K0
    #[serde(default = "default_vcf_k0")]
    pub vcf_k0: f64,

    /// VCF thermal expansion constant K1
    #[serde(default = "default_vcf_k1")]
    pub vcf_k1: f64,

    /// Shrinkage applied when the caller supplies none, in (0, 1]
    #[serde(default = "default_shrinkage")]
    pub default_shrinkage: f64,
}

fn default_vcf_k0() -> f64 { defaults::VCF_K0_CRUDE }
fn default_vcf_k1() -> f64 { defaults::VCF_K1_CRUDE }
fn default_shrinkage() -> f64 { defaults::DEFAULT_SHRINKAGE_FACTOR }

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            vcf_k0: default_vcf_k0(),
            vcf_k1: default_vcf_k1(),
            default_shrinkage: default_shrinkage(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_DATA_DIR)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
