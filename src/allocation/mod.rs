//! Allocation Distributor
//!
//! Distributes facility meter totals across the wells behind the meter.
//!
//! | Method            | Volumes                                           |
//! |-------------------|---------------------------------------------------|
//! | `manual`          | caller-supplied, passed through                   |
//! | `potential_based` | caller-supplied, passed through                   |
//! | `pro_rata`        | normalized caller factors × total                 |
//! | `test_based`      | latest well test on or before the date × total   |
//!
//! test_based resolves each well's rate through a [`WellTestLookup`]. The
//! lookups are independent and run concurrently, bounded by
//! `allocation.lookup_concurrency`; results keep the input order.

pub mod distribution;

pub use distribution::{pass_through, pro_rata, share_percent, test_based, ResolvedRate};

use chrono::NaiveDate;
use futures::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{EngineConfig, ZeroFactorPolicy};
use crate::storage::{StorageError, WellTestLookup};
use crate::types::{
    AllocationBatch, AllocationMethod, FacilityTotals, RateSource, ValidationError,
    WellAllocation, WellAllocationInput,
};

/// Error type for allocation runs
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("invalid allocation input: {0}")]
    Invalid(#[from] ValidationError),
    #[error("pro_rata factors sum to zero across {wells} wells")]
    ZeroFactorSum { wells: usize },
    #[error("allocation needs at least one well")]
    NoWells,
    #[error("well {0} appears more than once in the batch")]
    DuplicateWell(String),
    #[error("{0} allocation needs an as-of date")]
    MissingAsOfDate(AllocationMethod),
    #[error("well test lookup failed for {well_id}")]
    Lookup {
        well_id: String,
        #[source]
        source: StorageError,
    },
}

/// One facility's allocation for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub allocation_date: NaiveDate,
    pub facility_id: String,
    pub method: AllocationMethod,
    pub totals: FacilityTotals,
    pub wells: Vec<WellAllocationInput>,
}

/// Runs allocations with a fixed zero-factor policy and lookup concurrency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocator {
    policy: ZeroFactorPolicy,
    concurrency: usize,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Allocator {
    pub fn new(policy: ZeroFactorPolicy, concurrency: usize) -> Self {
        Self {
            policy,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.allocation.zero_factor_policy,
            config.allocation.lookup_concurrency,
        )
    }

    /// Allocate one facility batch. test_based looks tests up as of the
    /// request's allocation date.
    pub async fn allocate_batch<L>(
        &self,
        request: &AllocationRequest,
        lookup: &L,
    ) -> Result<AllocationBatch, AllocationError>
    where
        L: WellTestLookup + ?Sized,
    {
        check_facility_id(&request.facility_id)?;

        let wells = self
            .allocate(
                request.method,
                &request.totals,
                &request.wells,
                Some(request.allocation_date),
                lookup,
            )
            .await?;

        info!(
            facility = %request.facility_id,
            date = %request.allocation_date,
            method = %request.method,
            wells = wells.len(),
            "Allocation complete"
        );

        Ok(AllocationBatch {
            allocation_date: request.allocation_date,
            facility_id: request.facility_id.clone(),
            method: request.method,
            totals: request.totals,
            wells,
        })
    }

    /// Distribute `totals` across `wells` by `method`.
    ///
    /// `as_of` is required for test_based and ignored otherwise.
    pub async fn allocate<L>(
        &self,
        method: AllocationMethod,
        totals: &FacilityTotals,
        wells: &[WellAllocationInput],
        as_of: Option<NaiveDate>,
        lookup: &L,
    ) -> Result<Vec<WellAllocation>, AllocationError>
    where
        L: WellTestLookup + ?Sized,
    {
        validate_inputs(totals, wells)?;

        match method {
            AllocationMethod::Manual | AllocationMethod::PotentialBased => Ok(pass_through(wells)),
            AllocationMethod::ProRata => pro_rata(totals, wells, self.policy),
            AllocationMethod::TestBased => {
                let as_of = as_of.ok_or(AllocationError::MissingAsOfDate(method))?;
                let rates = self.resolve_rates(wells, as_of, lookup).await?;
                Ok(test_based(totals, wells, &rates))
            }
        }
    }

    /// Latest test on or before `as_of` for each well, else its fallback,
    /// else zero. Output order matches `wells`.
    pub async fn resolve_rates<L>(
        &self,
        wells: &[WellAllocationInput],
        as_of: NaiveDate,
        lookup: &L,
    ) -> Result<Vec<ResolvedRate>, AllocationError>
    where
        L: WellTestLookup + ?Sized,
    {
        let started = Instant::now();

        let resolved: Vec<ResolvedRate> = stream::iter(wells)
            .map(|well| async move {
                let found = lookup
                    .find_latest_well_test(&well.well_id, as_of)
                    .await
                    .map_err(|source| AllocationError::Lookup {
                        well_id: well.well_id.clone(),
                        source,
                    })?;

                let rate = match (found, well.fallback_rates) {
                    (Some(test), _) => ResolvedRate {
                        rates: test.rates,
                        source: RateSource::WellTest(test.test_date),
                    },
                    (None, Some(rates)) => ResolvedRate {
                        rates,
                        source: RateSource::Fallback,
                    },
                    (None, None) => ResolvedRate::missing(),
                };
                debug!(well = %well.well_id, source = ?rate.source, "Well rate resolved");
                Ok::<_, AllocationError>(rate)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let missing = resolved
            .iter()
            .filter(|r| r.source == RateSource::Missing)
            .count();
        debug!(
            backend = lookup.backend_name(),
            wells = resolved.len(),
            missing,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Well tests resolved"
        );

        Ok(resolved)
    }
}

/// Distribute with the global configuration.
pub async fn allocate(
    method: AllocationMethod,
    totals: &FacilityTotals,
    wells: &[WellAllocationInput],
    as_of: Option<NaiveDate>,
    lookup: &dyn WellTestLookup,
) -> Result<Vec<WellAllocation>, AllocationError> {
    Allocator::from_config(crate::config::get())
        .allocate(method, totals, wells, as_of, lookup)
        .await
}

fn check_facility_id(facility_id: &str) -> Result<(), ValidationError> {
    if facility_id.trim().is_empty() {
        return Err(ValidationError::Empty { field: "facility_id" });
    }
    Ok(())
}

fn validate_inputs(
    totals: &FacilityTotals,
    wells: &[WellAllocationInput],
) -> Result<(), AllocationError> {
    totals.validate()?;
    if wells.is_empty() {
        return Err(AllocationError::NoWells);
    }

    let mut seen = HashSet::with_capacity(wells.len());
    for well in wells {
        well.validate()?;
        if !seen.insert(well.well_id.as_str()) {
            return Err(AllocationError::DuplicateWell(well.well_id.clone()));
        }
    }
    Ok(())
}
