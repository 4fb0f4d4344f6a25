//! PetroFlow: Production Volume Standardization & Allocation
//!
//! Converts gross daily field measurements into standardized volumes and
//! distributes facility meter totals back to individual wells.
//!
//! ## Architecture
//!
//! - **Standardization**: BSW correction, gas temperature/pressure correction,
//!   GOR, water cut and efficiency (plus an opt-in VCF/shrinkage pipeline)
//! - **Allocation**: manual, potential_based, pro_rata and test_based
//!   distribution of facility totals
//! - **Storage**: sled-backed ledger of readings, well tests and allocations
//! - **Config**: TOML engine configuration with typo detection

pub mod allocation;
pub mod config;
pub mod standardization;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::EngineConfig;

// Re-export commonly used types
pub use types::{
    AllocationBatch, AllocationMethod, FacilityTotals, ProductionReading, ProductionRecord,
    RateSource, StandardizedProduction, StreamRates, ValidationError, WellAllocation,
    WellAllocationInput, WellTestRate,
};

// Re-export the calculators
pub use allocation::{allocate, AllocationError, AllocationRequest, Allocator};
pub use standardization::{standardize, AdvancedStandardizer, Standardizer};

// Re-export storage
pub use storage::{InMemoryWellTests, Ledger, StorageError, WellTestLookup};
