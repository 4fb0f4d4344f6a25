//! Closed-form standardization formulas
//!
//! Each function is one step of the canonical pipeline:
//! - BSW correction (gross -> net oil)
//! - Gas correction to standard temperature/pressure
//! - GOR, water cut, production efficiency
//!
//! Every divide-by-possible-zero site yields 0 rather than NaN/Inf.

use crate::config::defaults::{HOURS_PER_DAY, RANKINE_OFFSET};
use crate::config::StandardConditions;

// ============================================================================
// Oil
// ============================================================================

/// Net oil after removing basic sediment & water.
///
/// Formula: netOil = grossOil × (1 − BSW/100)
///
/// BSW is expected in [0, 100]; range checking happens at the boundary.
pub fn net_oil_volume(gross_oil: f64, bsw_percent: f64) -> f64 {
    gross_oil * (1.0 - bsw_percent / 100.0)
}

// ============================================================================
// Gas
// ============================================================================

/// Correct a field gas volume to standard conditions (ideal gas law).
///
/// Formula: stdGas = gas × (P / Pstd) × (Tstd / T)
///
/// Where:
/// - P = flowing tubing pressure (psia)
/// - T = flowing temperature (°R = °F + 459.67)
/// - Pstd, Tstd = standard conditions
///
/// Independent of oil volume. Returns 0 for an absolute temperature <= 0.
pub fn std_gas_volume(
    gross_gas: f64,
    temperature_f: f64,
    pressure_psia: f64,
    standard: &StandardConditions,
) -> f64 {
    let field_temp_abs = temperature_f + RANKINE_OFFSET;
    if field_temp_abs <= 0.0 || standard.pressure_psia <= 0.0 {
        return 0.0;
    }

    gross_gas * (pressure_psia / standard.pressure_psia) * (standard.temperature_rankine() / field_temp_abs)
}

// ============================================================================
// Ratios
// ============================================================================

/// Gas-oil ratio (Mcf/bbl).
///
/// Defined as 0 when there is no net oil.
pub fn gas_oil_ratio(std_gas: f64, net_oil: f64) -> f64 {
    if net_oil > 0.0 {
        std_gas / net_oil
    } else {
        0.0
    }
}

/// Water share of total liquid, as a percentage.
///
/// Formula: waterCut = water / (netOil + water) × 100, 0 when no liquid.
pub fn water_cut(net_oil: f64, water: f64) -> f64 {
    let total_liquid = net_oil + water;
    if total_liquid > 0.0 {
        water / total_liquid * 100.0
    } else {
        0.0
    }
}

/// Share of the production day the well was flowing, as a percentage.
pub fn production_efficiency(operating_hours: f64) -> f64 {
    operating_hours / HOURS_PER_DAY * 100.0
}

// ============================================================================
// Rounding
// ============================================================================

const MIDPOINT_ULPS: f64 = 4.0;

/// Round half-up at the given number of decimals.
///
/// Decimal midpoints that f64 stores just below the half (1.005 is
/// 1.00499999999999989...) still round up: the scaled value is nudged by a
/// few ulps before flooring.
///
/// `round_half_up(1.005, 2) == 1.01`, `round_half_up(-0.005, 2) == 0.0`.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    let nudged = scaled + scaled.abs() * MIDPOINT_ULPS * f64::EPSILON;
    let rounded = (nudged + 0.5).floor() / factor;
    // Avoid "-0.00" in output
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
