//! Daily production reading types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{
    check_finite, check_id, check_non_negative, check_optional, check_positive, check_range,
    ValidationError,
};

/// Absolute zero in °F. Field temperatures at or below this are impossible.
pub const ABSOLUTE_ZERO_F: f64 = -459.67;

/// Gross daily field reading for one well ("FDC" record).
///
/// Unique per (`well_id`, `production_date`). Every measurement is optional;
/// missing volumes count as zero and missing temperature/pressure fall back
/// to standard conditions during standardization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionReading {
    pub well_id: String,
    pub production_date: NaiveDate,

    // === Gross volumes ===
    /// Gross oil (bbl)
    #[serde(default)]
    pub gross_oil_volume: Option<f64>,
    /// Gross gas (Mcf)
    #[serde(default)]
    pub gross_gas_volume: Option<f64>,
    /// Gross water (bbl)
    #[serde(default)]
    pub gross_water_volume: Option<f64>,

    // === Operating conditions ===
    /// Hours on production (0-24)
    #[serde(default)]
    pub operating_hours: Option<f64>,
    /// Basic sediment & water (%), 0-100
    #[serde(default, alias = "bsw")]
    pub sand_water_percentage: Option<f64>,
    /// Flowing temperature (°F)
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Flowing tubing pressure (psia)
    #[serde(default)]
    pub flowing_tubing_pressure: Option<f64>,
    /// Flowing casing pressure (psia), recorded only
    #[serde(default)]
    pub flowing_casing_pressure: Option<f64>,
    /// Choke size (64ths of an inch), recorded only
    #[serde(default)]
    pub choke_size: Option<f64>,
}

impl ProductionReading {
    /// Empty reading for a well/date; all measurements absent.
    pub fn new(well_id: impl Into<String>, production_date: NaiveDate) -> Self {
        Self {
            well_id: well_id.into(),
            production_date,
            gross_oil_volume: None,
            gross_gas_volume: None,
            gross_water_volume: None,
            operating_hours: None,
            sand_water_percentage: None,
            temperature: None,
            flowing_tubing_pressure: None,
            flowing_casing_pressure: None,
            choke_size: None,
        }
    }

    /// Range checks applied before a reading enters the calculator.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("well_id", &self.well_id)?;

        check_optional(self.gross_oil_volume, |v| check_non_negative("gross_oil_volume", v))?;
        check_optional(self.gross_gas_volume, |v| check_non_negative("gross_gas_volume", v))?;
        check_optional(self.gross_water_volume, |v| {
            check_non_negative("gross_water_volume", v)
        })?;

        check_optional(self.operating_hours, |v| {
            check_range("operating_hours", v, 0.0, 24.0)
        })?;
        check_optional(self.sand_water_percentage, |v| {
            check_range("sand_water_percentage", v, 0.0, 100.0)
        })?;

        check_optional(self.temperature, |v| {
            check_finite("temperature", v)?;
            if v <= ABSOLUTE_ZERO_F {
                return Err(ValidationError::OutOfRange {
                    field: "temperature",
                    value: v,
                    min: ABSOLUTE_ZERO_F,
                    max: f64::MAX,
                });
            }
            Ok(())
        })?;
        check_optional(self.flowing_tubing_pressure, |v| {
            check_positive("flowing_tubing_pressure", v)
        })?;
        check_optional(self.flowing_casing_pressure, |v| {
            check_non_negative("flowing_casing_pressure", v)
        })?;
        check_optional(self.choke_size, |v| check_non_negative("choke_size", v))?;

        Ok(())
    }
}

/// Standardized ("STD") values derived 1:1 from a `ProductionReading`.
///
/// Computed, never edited directly. All fields are rounded to the
/// configured number of decimals (2 by default).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardizedProduction {
    /// Net oil after BSW correction (bbl)
    pub net_oil_volume: f64,
    /// Gas corrected to standard temperature and pressure (Mcf)
    pub std_gas_volume: f64,
    /// Water (bbl), carried through uncorrected
    pub std_water_volume: f64,
    /// Gas-oil ratio (Mcf/bbl), 0 when there is no net oil
    pub gor: f64,
    /// Water share of total liquid (%)
    pub water_cut: f64,
    /// Share of the day on production (%)
    pub production_efficiency: f64,
}

/// A reading together with its derived record, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub reading: ProductionReading,
    pub standardized: StandardizedProduction,
}
