//! Advanced multi-step correction pipeline
//!
//! Chains named correction steps, each recorded in a trace:
//! 1. BSW correction
//! 2. VCF (temperature correction to base, API MPMS 11.1 crude oil)
//! 3. Shrinkage factor (reservoir -> stock tank)
//! 4. Associated gas via GOR, when no gas was measured
//!
//! This pipeline is opt-in and independent from `standardize`; the two are
//! never combined.

use serde::{Deserialize, Serialize};

use super::formulas::{net_oil_volume, round_half_up};
use crate::config::defaults::WATER_DENSITY_60F_KG_M3;
use crate::config::{AdvancedConfig, EngineConfig, StandardConditions};
use crate::types::ValidationError;

// ============================================================================
// Gravity Conversions
// ============================================================================

/// Specific gravity at 60 °F from API gravity.
///
/// Formula: SG = 141.5 / (API + 131.5)
///
/// Negative API gravity is rejected.
pub fn specific_gravity(api_gravity: f64) -> Result<f64, ValidationError> {
    if !api_gravity.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "api_gravity",
        });
    }
    if api_gravity < 0.0 {
        return Err(ValidationError::Negative {
            field: "api_gravity",
            value: api_gravity,
        });
    }
    Ok(141.5 / (api_gravity + 131.5))
}

/// API gravity from specific gravity at 60 °F. SG must be > 0.
pub fn api_gravity(specific_gravity: f64) -> Result<f64, ValidationError> {
    if !specific_gravity.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "specific_gravity",
        });
    }
    if specific_gravity <= 0.0 {
        return Err(ValidationError::NotPositive {
            field: "specific_gravity",
            value: specific_gravity,
        });
    }
    Ok(141.5 / specific_gravity - 131.5)
}

// ============================================================================
// Volume Correction Factor
// ============================================================================

/// Temperature volume correction factor (CTL) for crude oil.
///
/// API MPMS 11.1 (1980):
/// - ρ60 = SG × 999.016 kg/m³
/// - α = K0/ρ60² + K1/ρ60
/// - VCF = exp(−α·ΔT·(1 + 0.8·α·ΔT)), ΔT = T − Tbase
///
/// Returns 1.0 at base temperature, < 1 above it, > 1 below it.
pub fn volume_correction_factor(
    api_gravity: f64,
    observed_temperature_f: f64,
    base_temperature_f: f64,
    constants: &AdvancedConfig,
) -> Result<f64, ValidationError> {
    let sg = specific_gravity(api_gravity)?;
    if !observed_temperature_f.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "observed_temperature_f",
        });
    }

    let rho60 = sg * WATER_DENSITY_60F_KG_M3;
    let alpha = constants.vcf_k0 / (rho60 * rho60) + constants.vcf_k1 / rho60;
    let delta_t = observed_temperature_f - base_temperature_f;

    Ok((-alpha * delta_t * (1.0 + 0.8 * alpha * delta_t)).exp())
}

// ============================================================================
// Pipeline
// ============================================================================

/// Input to the advanced pipeline for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvancedInput {
    pub gross_oil_volume: f64,
    #[serde(default, alias = "bsw")]
    pub bsw_percent: f64,
    /// Observed oil temperature (°F); base temperature when absent
    pub observed_temperature_f: Option<f64>,
    pub api_gravity: f64,
    /// (0, 1]; the configured default when absent
    pub shrinkage_factor: Option<f64>,
    /// Measured gas (Mcf); takes precedence over GOR
    pub measured_gas_volume: Option<f64>,
    /// Solution GOR (Mcf/bbl) used when no gas was measured
    pub gor: Option<f64>,
}

/// One named step of the chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionStep {
    pub name: &'static str,
    pub input: f64,
    pub factor: f64,
    pub output: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedResult {
    /// After BSW (bbl)
    pub net_oil_volume: f64,
    /// After temperature correction (bbl)
    pub corrected_oil_volume: f64,
    /// After shrinkage (bbl)
    pub stock_tank_oil_volume: f64,
    pub volume_correction_factor: f64,
    pub shrinkage_factor: f64,
    /// Measured or GOR-derived gas (Mcf)
    pub gas_volume: f64,
    pub steps: Vec<CorrectionStep>,
}

/// Runs the advanced chain with fixed base conditions and constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvancedStandardizer {
    base: StandardConditions,
    constants: AdvancedConfig,
    decimals: u32,
}

impl Default for AdvancedStandardizer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl AdvancedStandardizer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            base: config.standard_conditions,
            constants: config.advanced,
            decimals: config.rounding.decimals,
        }
    }

    /// Run every step in order. Fails on the first invalid input.
    pub fn run(&self, input: &AdvancedInput) -> Result<AdvancedResult, ValidationError> {
        validate_input(input)?;
        let mut steps = Vec::with_capacity(4);

        // 1. BSW
        let bsw_factor = 1.0 - input.bsw_percent / 100.0;
        let net_oil = net_oil_volume(input.gross_oil_volume, input.bsw_percent);
        steps.push(CorrectionStep {
            name: "bsw",
            input: input.gross_oil_volume,
            factor: bsw_factor,
            output: net_oil,
        });

        // 2. VCF
        let observed = input
            .observed_temperature_f
            .unwrap_or(self.base.temperature_f);
        let vcf = volume_correction_factor(
            input.api_gravity,
            observed,
            self.base.temperature_f,
            &self.constants,
        )?;
        let corrected = net_oil * vcf;
        steps.push(CorrectionStep {
            name: "vcf",
            input: net_oil,
            factor: vcf,
            output: corrected,
        });

        // 3. Shrinkage
        let shrinkage = input
            .shrinkage_factor
            .unwrap_or(self.constants.default_shrinkage);
        let stock_tank = corrected * shrinkage;
        steps.push(CorrectionStep {
            name: "shrinkage",
            input: corrected,
            factor: shrinkage,
            output: stock_tank,
        });

        // 4. Gas: measured wins, else associated via GOR, else none
        let gas = match (input.measured_gas_volume, input.gor) {
            (Some(measured), _) => measured,
            (None, Some(gor)) => {
                let associated = stock_tank * gor;
                steps.push(CorrectionStep {
                    name: "associated_gas",
                    input: stock_tank,
                    factor: gor,
                    output: associated,
                });
                associated
            }
            (None, None) => 0.0,
        };

        let round = |v: f64| round_half_up(v, self.decimals);
        Ok(AdvancedResult {
            net_oil_volume: round(net_oil),
            corrected_oil_volume: round(corrected),
            stock_tank_oil_volume: round(stock_tank),
            volume_correction_factor: vcf,
            shrinkage_factor: shrinkage,
            gas_volume: round(gas),
            steps,
        })
    }
}

fn validate_input(input: &AdvancedInput) -> Result<(), ValidationError> {
    use crate::types::ValidationError as E;

    if !input.gross_oil_volume.is_finite() {
        return Err(E::NotFinite {
            field: "gross_oil_volume",
        });
    }
    if input.gross_oil_volume < 0.0 {
        return Err(E::Negative {
            field: "gross_oil_volume",
            value: input.gross_oil_volume,
        });
    }
    if !(0.0..=100.0).contains(&input.bsw_percent) {
        return Err(E::OutOfRange {
            field: "bsw_percent",
            value: input.bsw_percent,
            min: 0.0,
            max: 100.0,
        });
    }
    if let Some(s) = input.shrinkage_factor {
        if !(s > 0.0 && s <= 1.0) {
            return Err(E::OutOfRange {
                field: "shrinkage_factor",
                value: s,
                min: 0.0,
                max: 1.0,
            });
        }
    }
    if let Some(gas) = input.measured_gas_volume {
        if !gas.is_finite() || gas < 0.0 {
            return Err(E::Negative {
                field: "measured_gas_volume",
                value: gas,
            });
        }
    }
    // GOR only matters without measured gas, but a non-positive GOR is never valid
    if let Some(gor) = input.gor {
        if !(gor.is_finite() && gor > 0.0) {
            return Err(E::NotPositive {
                field: "gor",
                value: gor,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AdvancedInput {
        AdvancedInput {
            gross_oil_volume: 1_000.0,
            bsw_percent: 2.0,
            observed_temperature_f: Some(100.0),
            api_gravity: 35.0,
            shrinkage_factor: Some(0.98),
            measured_gas_volume: None,
            gor: Some(0.5),
        }
    }

    #[test]
    fn test_specific_gravity_of_water() {
        let sg = specific_gravity(10.0).expect("valid API");
        assert!((sg - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_api_rejected() {
        assert!(matches!(
            specific_gravity(-1.0),
            Err(ValidationError::Negative { field: "api_gravity", .. })
        ));
    }

    #[test]
    fn test_api_gravity_inverts_specific_gravity() {
        let sg = specific_gravity(35.0).expect("valid API");
        let api = api_gravity(sg).expect("valid SG");
        assert!((api - 35.0).abs() < 1e-9);
        assert!(api_gravity(0.0).is_err());
    }

    #[test]
    fn test_vcf_is_one_at_base_temperature() {
        let vcf = volume_correction_factor(35.0, 60.0, 60.0, &AdvancedConfig::default())
            .expect("valid inputs");
        assert!((vcf - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_vcf_direction() {
        let cfg = AdvancedConfig::default();
        let hot = volume_correction_factor(35.0, 100.0, 60.0, &cfg).expect("valid");
        let cold = volume_correction_factor(35.0, 30.0, 60.0, &cfg).expect("valid");
        assert!(hot < 1.0, "oil above base contracts when corrected, got {hot}");
        assert!(cold > 1.0, "oil below base expands when corrected, got {cold}");
        // Table 6A reads ~0.9808 for 35 API at 100 °F
        assert!((hot - 0.9810).abs() < 0.001, "got {hot}");
    }

    #[test]
    fn test_pipeline_chains_steps_in_order() {
        let result = AdvancedStandardizer::default().run(&input()).expect("valid input");
        let names: Vec<_> = result.steps.iter().map(|s| s.name).collect();
        assert_eq!(names, ["bsw", "vcf", "shrinkage", "associated_gas"]);

        // Each step feeds the next
        for pair in result.steps.windows(2) {
            assert!((pair[0].output - pair[1].input).abs() < 1e-9);
        }

        assert_eq!(result.net_oil_volume, 980.0);
        assert!(result.corrected_oil_volume < 980.0);
        assert!(result.stock_tank_oil_volume < result.corrected_oil_volume);
        let expected_gas = round_half_up(result.steps[2].output * 0.5, 2);
        assert_eq!(result.gas_volume, expected_gas);
    }

    #[test]
    fn test_measured_gas_wins_over_gor() {
        let mut i = input();
        i.measured_gas_volume = Some(123.4);
        let result = AdvancedStandardizer::default().run(&i).expect("valid input");
        assert_eq!(result.gas_volume, 123.4);
        assert_eq!(result.steps.len(), 3);
    }

    #[test]
    fn test_defaults_leave_volume_unchanged() {
        let i = AdvancedInput {
            gross_oil_volume: 500.0,
            bsw_percent: 0.0,
            observed_temperature_f: None,
            api_gravity: 30.0,
            shrinkage_factor: None,
            measured_gas_volume: None,
            gor: None,
        };
        let result = AdvancedStandardizer::default().run(&i).expect("valid input");
        assert_eq!(result.stock_tank_oil_volume, 500.0);
        assert_eq!(result.gas_volume, 0.0);
    }

    #[test]
    fn test_non_positive_gor_rejected() {
        let mut i = input();
        i.gor = Some(0.0);
        assert!(matches!(
            AdvancedStandardizer::default().run(&i),
            Err(ValidationError::NotPositive { field: "gor", .. })
        ));
    }

    #[test]
    fn test_bad_shrinkage_rejected() {
        let mut i = input();
        i.shrinkage_factor = Some(1.5);
        assert!(AdvancedStandardizer::default().run(&i).is_err());
    }
}
