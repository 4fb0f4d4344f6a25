//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::defaults;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for EngineConfig.
///
/// Any new field added to EngineConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [facility]
        "facility",
        "facility.name",
        "facility.field",
        // [standard_conditions]
        "standard_conditions",
        "standard_conditions.temperature_f",
        "standard_conditions.pressure_psia",
        // [rounding]
        "rounding",
        "rounding.decimals",
        // [allocation]
        "allocation",
        "allocation.zero_factor_policy",
        "allocation.lookup_concurrency",
        // [advanced]
        "advanced",
        "advanced.vcf_k0",
        "advanced.vcf_k1",
        "advanced.default_shrinkage",
        // [storage]
        "storage",
        "storage.data_dir",
    ];
    keys.iter().copied().collect()
}

/// Recursively collect dotted key paths from a TOML value.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed EngineConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::EngineConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let sc = &config.standard_conditions;
    let adv = &config.advanced;

    for (name, value) in [
        ("standard_conditions.temperature_f", sc.temperature_f),
        ("standard_conditions.pressure_psia", sc.pressure_psia),
        ("advanced.vcf_k0", adv.vcf_k0),
        ("advanced.vcf_k1", adv.vcf_k1),
        ("advanced.default_shrinkage", adv.default_shrinkage),
    ] {
        if !value.is_finite() {
            errors.push(format!("{name} must be a finite number (got {value})"));
        }
    }

    // Base temperature: must be above absolute zero (Rankine divisor)
    if sc.temperature_f <= -defaults::RANKINE_OFFSET {
        errors.push(format!(
            "standard_conditions.temperature_f = {:.2} is at or below absolute zero",
            sc.temperature_f
        ));
    }

    // Base pressure: used as divisor in gas correction
    if sc.pressure_psia <= 0.0 {
        errors.push(format!(
            "standard_conditions.pressure_psia = {:.3} must be > 0 (used as divisor)",
            sc.pressure_psia
        ));
    }

    if config.rounding.decimals > defaults::MAX_DECIMALS {
        errors.push(format!(
            "rounding.decimals = {} exceeds maximum of {}",
            config.rounding.decimals,
            defaults::MAX_DECIMALS
        ));
    }

    if config.allocation.lookup_concurrency == 0 {
        errors.push("allocation.lookup_concurrency must be > 0".to_string());
    }

    if adv.vcf_k0 < 0.0 {
        errors.push(format!("advanced.vcf_k0 = {:.4} cannot be negative", adv.vcf_k0));
    }

    if adv.default_shrinkage <= 0.0 || adv.default_shrinkage > 1.0 {
        errors.push(format!(
            "advanced.default_shrinkage = {:.4} must be in (0, 1]",
            adv.default_shrinkage
        ));
    }

    // Base conditions in use worldwide sit between 0 °C and 20 °C
    if sc.temperature_f.is_finite() && !(32.0..=68.0).contains(&sc.temperature_f) {
        warnings.push(ValidationWarning {
            field: "standard_conditions.temperature_f".to_string(),
            message: format!(
                "standard_conditions.temperature_f = {:.1} is outside typical base range (32-68 °F)",
                sc.temperature_f
            ),
            suggestion: None,
        });
    }

    if sc.pressure_psia > 0.0 && !(14.0..=15.1).contains(&sc.pressure_psia) {
        warnings.push(ValidationWarning {
            field: "standard_conditions.pressure_psia".to_string(),
            message: format!(
                "standard_conditions.pressure_psia = {:.3} is outside typical base range (14.0-15.1 psia)",
                sc.pressure_psia
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("decimals", "decimals"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("decimls", "decimals"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [standard_conditions]
            temperature_f = 60.0
        "#
        .parse()
        .expect("valid TOML");
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"standard_conditions".to_string()));
        assert!(keys.contains(&"standard_conditions.temperature_f".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[allocation]
lookup_concurency = 4
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("lookup_concurency"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("allocation.lookup_concurrency")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[facility]
name = "CPF-1"
field = "Ekofisk"

[standard_conditions]
temperature_f = 60.0
pressure_psia = 14.696

[storage]
data_dir = "/var/lib/petroflow"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_defaults_clean() {
        let (errors, warnings) = validate_physical_ranges(&EngineConfig::default());
        assert!(errors.is_empty(), "Defaults should produce no errors: {:?}", errors);
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {:?}", warnings);
    }

    #[test]
    fn test_absolute_zero_base_temperature_is_error() {
        let mut config = EngineConfig::default();
        config.standard_conditions.temperature_f = -500.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("absolute zero")));
    }

    #[test]
    fn test_metric_base_temperature_is_clean() {
        // 15 °C reference
        let mut config = EngineConfig::default();
        config.standard_conditions.temperature_f = 59.0;
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_hot_base_temperature_warns() {
        let mut config = EngineConfig::default();
        config.standard_conditions.temperature_f = 120.0;
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "standard_conditions.temperature_f"));
    }

    #[test]
    fn test_shrinkage_out_of_range() {
        let mut config = EngineConfig::default();
        config.advanced.default_shrinkage = 1.2;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("default_shrinkage")));
    }

    #[test]
    fn test_zero_concurrency_is_error() {
        let mut config = EngineConfig::default();
        config.allocation.lookup_concurrency = 0;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("lookup_concurrency")));
    }

    #[test]
    fn test_nan_is_error() {
        let mut config = EngineConfig::default();
        config.advanced.vcf_k1 = f64::NAN;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("vcf_k1")));
    }
}
