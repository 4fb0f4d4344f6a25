//! Standardization Calculator
//!
//! Deterministic conversion of gross daily readings into standardized
//! volumes and ratios. No state, no I/O.
//!
//! ## Canonical pipeline (`standardize`)
//! 1. `net_oil_volume()` - BSW correction
//! 2. `std_gas_volume()` - temperature/pressure gas correction
//! 3. `gas_oil_ratio()` - 0 when no net oil
//! 4. `water_cut()` - 0 when no liquid
//! 5. `production_efficiency()` - operating hours over 24
//!
//! Outputs are rounded half-up to the configured decimals.
//!
//! ## Advanced pipeline (`advanced`)
//! A separate, opt-in chain (BSW -> VCF -> shrinkage -> associated gas).
//! It is never mixed into `standardize`.

pub mod advanced;
pub mod formulas;

pub use advanced::{
    api_gravity, specific_gravity, volume_correction_factor, AdvancedInput, AdvancedResult,
    AdvancedStandardizer, CorrectionStep,
};
pub use formulas::{
    gas_oil_ratio, net_oil_volume, production_efficiency, round_half_up, std_gas_volume,
    water_cut,
};

use crate::config::{EngineConfig, StandardConditions};
use crate::types::{ProductionReading, StandardizedProduction};

/// Stateless calculator bound to a set of standard conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardizer {
    conditions: StandardConditions,
    decimals: u32,
}

impl Default for Standardizer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Standardizer {
    pub fn new(conditions: StandardConditions, decimals: u32) -> Self {
        Self {
            conditions,
            decimals,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.standard_conditions, config.rounding.decimals)
    }

    pub fn conditions(&self) -> &StandardConditions {
        &self.conditions
    }

    /// Map a gross reading to its standardized record.
    ///
    /// Missing volumes, BSW and hours count as 0; missing temperature and
    /// tubing pressure fall back to standard conditions (no gas correction).
    /// Ratios use unrounded intermediates; only the outputs are rounded.
    pub fn standardize(&self, reading: &ProductionReading) -> StandardizedProduction {
        let gross_oil = reading.gross_oil_volume.unwrap_or(0.0);
        let gross_gas = reading.gross_gas_volume.unwrap_or(0.0);
        let gross_water = reading.gross_water_volume.unwrap_or(0.0);
        let bsw = reading.sand_water_percentage.unwrap_or(0.0);
        let hours = reading.operating_hours.unwrap_or(0.0);
        let temperature = reading.temperature.unwrap_or(self.conditions.temperature_f);
        let pressure = reading
            .flowing_tubing_pressure
            .unwrap_or(self.conditions.pressure_psia);

        let net_oil = net_oil_volume(gross_oil, bsw);
        let std_gas = std_gas_volume(gross_gas, temperature, pressure, &self.conditions);
        let gor = gas_oil_ratio(std_gas, net_oil);
        let cut = water_cut(net_oil, gross_water);
        let efficiency = production_efficiency(hours);

        let round = |v: f64| round_half_up(v, self.decimals);
        StandardizedProduction {
            net_oil_volume: round(net_oil),
            std_gas_volume: round(std_gas),
            std_water_volume: round(gross_water),
            gor: round(gor),
            water_cut: round(cut),
            production_efficiency: round(efficiency),
        }
    }
}

/// Standardize a reading with the globally configured conditions.
///
/// See `Standardizer::standardize`.
pub fn standardize(reading: &ProductionReading) -> StandardizedProduction {
    Standardizer::from_config(crate::config::get()).standardize(reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading() -> ProductionReading {
        ProductionReading::new("W-1", NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"))
    }

    #[test]
    fn test_end_to_end_example() {
        let mut r = reading();
        r.gross_oil_volume = Some(100.0);
        r.gross_water_volume = Some(25.0);
        r.sand_water_percentage = Some(5.0);
        r.operating_hours = Some(20.0);

        let std = Standardizer::default().standardize(&r);
        assert_eq!(std.net_oil_volume, 95.0);
        assert_eq!(std.water_cut, 20.83);
        assert_eq!(std.production_efficiency, 83.33);
        assert_eq!(std.std_water_volume, 25.0);
        assert_eq!(std.std_gas_volume, 0.0);
        assert_eq!(std.gor, 0.0);
    }

    #[test]
    fn test_empty_reading_is_all_zero() {
        let std = Standardizer::default().standardize(&reading());
        assert_eq!(std, StandardizedProduction::default());
    }

    #[test]
    fn test_identity_at_standard_conditions() {
        let mut r = reading();
        r.gross_oil_volume = Some(412.37);
        r.gross_gas_volume = Some(1_234.56);
        r.sand_water_percentage = Some(0.0);
        r.temperature = Some(60.0);
        r.flowing_tubing_pressure = Some(14.7);

        let std = Standardizer::default().standardize(&r);
        assert_eq!(std.net_oil_volume, 412.37);
        assert_eq!(std.std_gas_volume, 1_234.56);
    }

    #[test]
    fn test_gas_corrected_without_oil() {
        let mut r = reading();
        r.gross_gas_volume = Some(100.0);
        r.temperature = Some(100.0);

        let std = Standardizer::default().standardize(&r);
        assert_eq!(std.std_gas_volume, 92.85);
        assert_eq!(std.gor, 0.0, "GOR is 0 with no oil, not infinite");
    }

    #[test]
    fn test_gor_uses_unrounded_intermediates() {
        let mut r = reading();
        r.gross_oil_volume = Some(3.0);
        r.gross_gas_volume = Some(1.0);

        let std = Standardizer::default().standardize(&r);
        assert_eq!(std.gor, 0.33);
    }

    #[test]
    fn test_outputs_round_half_up_on_inexact_midpoints() {
        let mut r = reading();
        r.gross_water_volume = Some(1.005);
        r.gross_oil_volume = Some(1.115);

        let std = Standardizer::default().standardize(&r);
        assert_eq!(std.std_water_volume, 1.01);
        assert_eq!(std.net_oil_volume, 1.12);
    }

    #[test]
    fn test_custom_decimals() {
        let mut r = reading();
        r.operating_hours = Some(20.0);
        let std = Standardizer::new(StandardConditions::default(), 0).standardize(&r);
        assert_eq!(std.production_efficiency, 83.0);
    }

    #[test]
    fn test_metric_base_conditions_default_field_values() {
        // Field temperature/pressure default to the configured base, so no correction
        let conditions = StandardConditions {
            temperature_f: 59.0,
            pressure_psia: 14.696,
        };
        let mut r = reading();
        r.gross_gas_volume = Some(500.0);
        let std = Standardizer::new(conditions, 2).standardize(&r);
        assert_eq!(std.std_gas_volume, 500.0);
    }

    #[test]
    fn test_global_standardize_uses_defaults() {
        let mut r = reading();
        r.gross_oil_volume = Some(200.0);
        r.sand_water_percentage = Some(10.0);
        assert_eq!(standardize(&r).net_oil_volume, 180.0);
    }
}
