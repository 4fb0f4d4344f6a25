//! Pure distribution math
//!
//! No I/O here: test_based rates are resolved by the caller and handed in
//! as `ResolvedRate`s, one per well in input order.

use super::AllocationError;
use crate::config::ZeroFactorPolicy;
use crate::types::{FacilityTotals, RateSource, StreamRates, WellAllocation, WellAllocationInput};

/// Effective rate for one well in a test_based run, and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRate {
    pub rates: StreamRates,
    pub source: RateSource,
}

impl ResolvedRate {
    pub fn missing() -> Self {
        Self {
            rates: StreamRates::default(),
            source: RateSource::Missing,
        }
    }
}

/// `part / whole × 100`, or 0 when there is nothing to share.
pub fn share_percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

fn portion(part: f64, whole: f64, total: f64) -> f64 {
    if whole > 0.0 {
        part / whole * total
    } else {
        0.0
    }
}

/// manual / potential_based: caller volumes and factors, unchanged.
///
/// Absent volumes are reported as zero.
pub fn pass_through(wells: &[WellAllocationInput]) -> Vec<WellAllocation> {
    wells
        .iter()
        .map(|w| WellAllocation {
            well_id: w.well_id.clone(),
            allocated_oil_volume: w.allocated_oil_volume.unwrap_or(0.0),
            allocated_gas_volume: w.allocated_gas_volume.unwrap_or(0.0),
            allocated_water_volume: w.allocated_water_volume.unwrap_or(0.0),
            allocation_factor: w.allocation_factor.unwrap_or(0.0),
            test_rates: None,
            rate_source: None,
        })
        .collect()
}

/// pro_rata: `allocated_i = factor_i / Σfactor × total` for each stream.
///
/// A missing factor counts as zero. When every factor is zero the
/// `policy` decides between an error and an equal split.
pub fn pro_rata(
    totals: &FacilityTotals,
    wells: &[WellAllocationInput],
    policy: ZeroFactorPolicy,
) -> Result<Vec<WellAllocation>, AllocationError> {
    let factors: Vec<f64> = match equalized_factors(wells, policy)? {
        Some(equal) => equal,
        None => wells
            .iter()
            .map(|w| w.allocation_factor.unwrap_or(0.0))
            .collect(),
    };
    let factor_sum: f64 = factors.iter().sum();

    Ok(wells
        .iter()
        .zip(&factors)
        .map(|(w, &factor)| WellAllocation {
            well_id: w.well_id.clone(),
            allocated_oil_volume: portion(factor, factor_sum, totals.oil),
            allocated_gas_volume: portion(factor, factor_sum, totals.gas),
            allocated_water_volume: portion(factor, factor_sum, totals.water),
            allocation_factor: share_percent(factor, factor_sum),
            test_rates: None,
            rate_source: None,
        })
        .collect())
}

/// `Some` equal weights when the factor sum is zero and the policy allows it.
fn equalized_factors(
    wells: &[WellAllocationInput],
    policy: ZeroFactorPolicy,
) -> Result<Option<Vec<f64>>, AllocationError> {
    let sum: f64 = wells.iter().filter_map(|w| w.allocation_factor).sum();
    if sum > 0.0 {
        return Ok(None);
    }
    match policy {
        ZeroFactorPolicy::Reject => Err(AllocationError::ZeroFactorSum { wells: wells.len() }),
        ZeroFactorPolicy::EqualSplit => Ok(Some(vec![1.0; wells.len()])),
    }
}

/// test_based: per stream, `factor_i = rate_i / Σrate × 100` and
/// `allocated_i = factor_i / 100 × total`.
///
/// `rates` must line up with `wells`. The reported `allocation_factor` is
/// the oil factor.
pub fn test_based(
    totals: &FacilityTotals,
    wells: &[WellAllocationInput],
    rates: &[ResolvedRate],
) -> Vec<WellAllocation> {
    let sum = rates
        .iter()
        .fold(StreamRates::default(), |acc, r| acc + r.rates);

    wells
        .iter()
        .zip(rates)
        .map(|(w, resolved)| {
            let r = resolved.rates;
            WellAllocation {
                well_id: w.well_id.clone(),
                allocated_oil_volume: portion(r.oil_rate, sum.oil_rate, totals.oil),
                allocated_gas_volume: portion(r.gas_rate, sum.gas_rate, totals.gas),
                allocated_water_volume: portion(r.water_rate, sum.water_rate, totals.water),
                allocation_factor: share_percent(r.oil_rate, sum.oil_rate),
                test_rates: Some(r),
                rate_source: Some(resolved.source),
            }
        })
        .collect()
}
