//! Allocation types: methods, facility totals, well inputs and results

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validation::{check_id, check_non_negative, check_optional, ValidationError};

/// How a facility total is distributed across its wells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    /// Caller-decided volumes, passed through unchanged
    Manual,
    /// Proportional to each well's latest test rate
    TestBased,
    /// Proportional to fixed, caller-supplied factors
    ProRata,
    /// Caller-decided volumes based on well potential, passed through unchanged
    PotentialBased,
}

impl AllocationMethod {
    pub const ALL: [Self; 4] = [Self::Manual, Self::TestBased, Self::ProRata, Self::PotentialBased];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::TestBased => "test_based",
            Self::ProRata => "pro_rata",
            Self::PotentialBased => "potential_based",
        }
    }

    /// Whether the engine derives volumes from the facility totals.
    pub fn is_computed(self) -> bool {
        matches!(self, Self::TestBased | Self::ProRata)
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                format!(
                    "unknown allocation method '{s}' (expected manual, test_based, pro_rata or potential_based)"
                )
            })
    }
}

/// Oil / gas / water rates from a well test (per day).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamRates {
    #[serde(default)]
    pub oil_rate: f64,
    #[serde(default)]
    pub gas_rate: f64,
    #[serde(default)]
    pub water_rate: f64,
}

impl StreamRates {
    pub fn new(oil_rate: f64, gas_rate: f64, water_rate: f64) -> Self {
        Self {
            oil_rate,
            gas_rate,
            water_rate,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_negative("oil_rate", self.oil_rate)?;
        check_non_negative("gas_rate", self.gas_rate)?;
        check_non_negative("water_rate", self.water_rate)
    }
}

impl std::ops::Add for StreamRates {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.oil_rate + rhs.oil_rate,
            self.gas_rate + rhs.gas_rate,
            self.water_rate + rhs.water_rate,
        )
    }
}

/// A recorded well test. Immutable once stored; newer tests supersede it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellTestRate {
    pub well_id: String,
    pub test_date: NaiveDate,
    #[serde(flatten)]
    pub rates: StreamRates,
}

impl WellTestRate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("well_id", &self.well_id)?;
        self.rates.validate()
    }
}

/// Facility-level meter totals for one allocation date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityTotals {
    #[serde(default)]
    pub oil: f64,
    #[serde(default)]
    pub gas: f64,
    #[serde(default)]
    pub water: f64,
}

impl FacilityTotals {
    pub fn new(oil: f64, gas: f64, water: f64) -> Self {
        Self { oil, gas, water }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_non_negative("total_oil", self.oil)?;
        check_non_negative("total_gas", self.gas)?;
        check_non_negative("total_water", self.water)
    }
}

/// Per-well input to an allocation run.
///
/// Which fields matter depends on the method:
/// - pro_rata reads `allocation_factor`
/// - test_based reads `fallback_rates` when the well has no test on record
/// - manual / potential_based pass the `allocated_*` volumes through
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WellAllocationInput {
    pub well_id: String,
    #[serde(default)]
    pub allocation_factor: Option<f64>,
    #[serde(default)]
    pub fallback_rates: Option<StreamRates>,
    #[serde(default)]
    pub allocated_oil_volume: Option<f64>,
    #[serde(default)]
    pub allocated_gas_volume: Option<f64>,
    #[serde(default)]
    pub allocated_water_volume: Option<f64>,
}

impl WellAllocationInput {
    pub fn new(well_id: impl Into<String>) -> Self {
        Self {
            well_id: well_id.into(),
            ..Self::default()
        }
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.allocation_factor = Some(factor);
        self
    }

    pub fn with_fallback(mut self, rates: StreamRates) -> Self {
        self.fallback_rates = Some(rates);
        self
    }

    pub fn with_volumes(mut self, oil: f64, gas: f64, water: f64) -> Self {
        self.allocated_oil_volume = Some(oil);
        self.allocated_gas_volume = Some(gas);
        self.allocated_water_volume = Some(water);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("well_id", &self.well_id)?;
        check_optional(self.allocation_factor, |v| {
            check_non_negative("allocation_factor", v)
        })?;
        if let Some(rates) = &self.fallback_rates {
            rates.validate()?;
        }
        check_optional(self.allocated_oil_volume, |v| {
            check_non_negative("allocated_oil_volume", v)
        })?;
        check_optional(self.allocated_gas_volume, |v| {
            check_non_negative("allocated_gas_volume", v)
        })?;
        check_optional(self.allocated_water_volume, |v| {
            check_non_negative("allocated_water_volume", v)
        })
    }
}

/// Where a test_based allocation got a well's rate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "test_date")]
pub enum RateSource {
    WellTest(NaiveDate),
    Fallback,
    Missing,
}

/// One well's share of an allocation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellAllocation {
    pub well_id: String,
    pub allocated_oil_volume: f64,
    pub allocated_gas_volume: f64,
    pub allocated_water_volume: f64,
    /// Percent share. For test_based this is the OIL factor.
    pub allocation_factor: f64,
    /// Rates used (test_based only)
    #[serde(default)]
    pub test_rates: Option<StreamRates>,
    #[serde(default)]
    pub rate_source: Option<RateSource>,
}

/// An allocation: one per (date, facility, method), with its well children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationBatch {
    pub allocation_date: NaiveDate,
    pub facility_id: String,
    pub method: AllocationMethod,
    pub totals: FacilityTotals,
    pub wells: Vec<WellAllocation>,
}

impl AllocationBatch {
    /// Sum of allocated volumes across all wells.
    pub fn allocated_sum(&self) -> FacilityTotals {
        self.wells.iter().fold(FacilityTotals::default(), |acc, w| {
            FacilityTotals::new(
                acc.oil + w.allocated_oil_volume,
                acc.gas + w.allocated_gas_volume,
                acc.water + w.allocated_water_volume,
            )
        })
    }

    /// Facility total minus allocated sum, per stream.
    ///
    /// Near zero for pro_rata and test_based whenever at least one well
    /// carries a nonzero factor or rate.
    pub fn unallocated(&self) -> FacilityTotals {
        let sum = self.allocated_sum();
        FacilityTotals::new(
            self.totals.oil - sum.oil,
            self.totals.gas - sum.gas,
            self.totals.water - sum.water,
        )
    }
}
