//! Shared data structures for production accounting
//!
//! This module defines the records that flow through the engine:
//! - `ProductionReading`: gross daily field measurement ("FDC") for one well
//! - `StandardizedProduction`: derived net/standard volumes ("STD")
//! - `WellTestRate` / `StreamRates`: measured test rates used as allocation basis
//! - `AllocationBatch` / `WellAllocation`: facility totals distributed per well
//!
//! Every input type carries a `validate()` used at the boundary. The
//! calculators themselves assume validated input.

mod allocation;
mod production;
mod validation;

pub use allocation::*;
pub use production::*;
pub use validation::*;
