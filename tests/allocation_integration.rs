//! Allocation Integration Tests
//!
//! Runs allocations end to end against a sled-backed ledger: well tests are
//! recorded, looked up as of the allocation date, distributed and stored.

use chrono::NaiveDate;
use petroflow::config::ZeroFactorPolicy;
use petroflow::storage::{Ledger, StorageError};
use petroflow::{
    AllocationError, AllocationMethod, AllocationRequest, Allocator, FacilityTotals,
    ProductionReading, RateSource, Standardizer, StreamRates, WellAllocationInput, WellTestRate,
};

const TOLERANCE: f64 = 1e-6;

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, day).expect("valid date")
}

fn open_ledger() -> (tempfile::TempDir, Ledger) {
    let dir = tempfile::tempdir().expect("tempdir");
    let ledger = Ledger::open(dir.path(), Standardizer::default()).expect("open ledger");
    (dir, ledger)
}

fn record_test(ledger: &Ledger, well: &str, date: NaiveDate, oil: f64, gas: f64, water: f64) {
    ledger
        .well_tests()
        .record(&WellTestRate {
            well_id: well.to_string(),
            test_date: date,
            rates: StreamRates::new(oil, gas, water),
        })
        .expect("record test");
}

fn request(method: AllocationMethod, wells: Vec<WellAllocationInput>) -> AllocationRequest {
    AllocationRequest {
        allocation_date: d(3, 31),
        facility_id: "CPF-1".to_string(),
        method,
        totals: FacilityTotals::new(600.0, 1_200.0, 300.0),
        wells,
    }
}

fn assert_conserved(batch: &petroflow::AllocationBatch) {
    let gap = batch.unallocated();
    assert!(gap.oil.abs() < TOLERANCE, "oil gap {}", gap.oil);
    assert!(gap.gas.abs() < TOLERANCE, "gas gap {}", gap.gas);
    assert!(gap.water.abs() < TOLERANCE, "water gap {}", gap.water);
}

#[tokio::test]
async fn test_based_allocation_from_stored_tests() {
    let (_dir, ledger) = open_ledger();
    record_test(&ledger, "W-1", d(1, 15), 10.0, 100.0, 1.0);
    record_test(&ledger, "W-1", d(3, 1), 30.0, 300.0, 10.0);
    record_test(&ledger, "W-2", d(2, 10), 20.0, 200.0, 10.0);
    record_test(&ledger, "W-3", d(3, 5), 10.0, 100.0, 30.0);
    // After the allocation date: must be ignored
    record_test(&ledger, "W-3", d(4, 2), 90.0, 900.0, 90.0);

    let wells = ["W-1", "W-2", "W-3"]
        .into_iter()
        .map(WellAllocationInput::new)
        .collect();
    let batch = Allocator::default()
        .allocate_batch(&request(AllocationMethod::TestBased, wells), ledger.well_tests())
        .await
        .expect("allocate");

    let oil: Vec<f64> = batch.wells.iter().map(|w| w.allocated_oil_volume).collect();
    assert!((oil[0] - 300.0).abs() < TOLERANCE);
    assert!((oil[1] - 200.0).abs() < TOLERANCE);
    assert!((oil[2] - 100.0).abs() < TOLERANCE);

    // Water follows water rates: 10 / 10 / 30 of 300
    assert!((batch.wells[2].allocated_water_volume - 180.0).abs() < TOLERANCE);

    assert_eq!(batch.wells[0].rate_source, Some(RateSource::WellTest(d(3, 1))));
    assert_eq!(batch.wells[2].rate_source, Some(RateSource::WellTest(d(3, 5))));
    assert_eq!(batch.wells[0].allocation_factor, 50.0);
    assert_conserved(&batch);

    ledger.allocations().save(&batch).expect("save");
    let stored = ledger
        .allocations()
        .get(d(3, 31), "CPF-1", AllocationMethod::TestBased)
        .expect("get")
        .expect("present");
    assert_eq!(stored, batch);
}

#[tokio::test]
async fn untested_well_gets_nothing_and_others_absorb_total() {
    let (_dir, ledger) = open_ledger();
    record_test(&ledger, "W-1", d(1, 1), 40.0, 80.0, 20.0);

    let wells = vec![WellAllocationInput::new("W-1"), WellAllocationInput::new("W-NEW")];
    let batch = Allocator::default()
        .allocate_batch(&request(AllocationMethod::TestBased, wells), ledger.well_tests())
        .await
        .expect("allocate");

    assert_eq!(batch.wells[1].allocated_oil_volume, 0.0);
    assert_eq!(batch.wells[1].rate_source, Some(RateSource::Missing));
    assert_eq!(batch.wells[0].allocated_oil_volume, 600.0);
    assert_conserved(&batch);
}

#[tokio::test]
async fn pro_rata_conserves_totals() {
    let (_dir, ledger) = open_ledger();
    let wells = [7.0, 3.0, 11.0, 0.5]
        .into_iter()
        .enumerate()
        .map(|(i, f)| WellAllocationInput::new(format!("W-{i}")).with_factor(f))
        .collect();

    let batch = Allocator::default()
        .allocate_batch(&request(AllocationMethod::ProRata, wells), ledger.well_tests())
        .await
        .expect("allocate");

    assert_conserved(&batch);
    let factor_sum: f64 = batch.wells.iter().map(|w| w.allocation_factor).sum();
    assert!((factor_sum - 100.0).abs() < TOLERANCE);
}

#[tokio::test]
async fn zero_factor_policy_is_honoured() {
    let (_dir, ledger) = open_ledger();
    let wells = || {
        vec![
            WellAllocationInput::new("W-1").with_factor(0.0),
            WellAllocationInput::new("W-2").with_factor(0.0),
        ]
    };

    let rejected = Allocator::new(ZeroFactorPolicy::Reject, 4)
        .allocate_batch(&request(AllocationMethod::ProRata, wells()), ledger.well_tests())
        .await;
    assert!(matches!(rejected, Err(AllocationError::ZeroFactorSum { wells: 2 })));

    let split = Allocator::new(ZeroFactorPolicy::EqualSplit, 4)
        .allocate_batch(&request(AllocationMethod::ProRata, wells()), ledger.well_tests())
        .await
        .expect("equal split");
    assert_eq!(split.wells[0].allocated_oil_volume, 300.0);
    assert_eq!(split.wells[1].allocated_gas_volume, 600.0);
    assert_conserved(&split);
}

#[tokio::test]
async fn zero_totals_give_zero_shares() {
    let (_dir, ledger) = open_ledger();
    record_test(&ledger, "W-1", d(1, 1), 40.0, 80.0, 20.0);

    let mut req = request(AllocationMethod::TestBased, vec![WellAllocationInput::new("W-1")]);
    req.totals = FacilityTotals::default();

    let batch = Allocator::default()
        .allocate_batch(&req, ledger.well_tests())
        .await
        .expect("allocate");
    let well = &batch.wells[0];
    assert_eq!(
        (well.allocated_oil_volume, well.allocated_gas_volume, well.allocated_water_volume),
        (0.0, 0.0, 0.0)
    );
}

#[tokio::test]
async fn manual_allocation_passes_through_and_is_unique_per_day() {
    let (_dir, ledger) = open_ledger();
    let wells = vec![
        WellAllocationInput::new("W-1").with_volumes(250.0, 500.0, 100.0),
        WellAllocationInput::new("W-2").with_volumes(100.0, 50.0, 25.0),
    ];
    let batch = Allocator::default()
        .allocate_batch(&request(AllocationMethod::Manual, wells), ledger.well_tests())
        .await
        .expect("allocate");

    assert_eq!(batch.wells[0].allocated_oil_volume, 250.0);
    // Manual allocations need not add up to the meter
    assert_eq!(batch.unallocated().oil, 250.0);

    ledger.allocations().save(&batch).expect("first save");
    assert!(matches!(
        ledger.allocations().save(&batch),
        Err(StorageError::Duplicate(_))
    ));
    assert_eq!(ledger.allocations().list_for_date(d(3, 31)).expect("list").len(), 1);
}

#[test]
fn readings_survive_reopen_with_their_standardized_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut reading = ProductionReading::new("W-1", d(3, 15));
    reading.gross_oil_volume = Some(100.0);
    reading.sand_water_percentage = Some(5.0);
    reading.gross_water_volume = Some(25.0);
    reading.operating_hours = Some(20.0);

    {
        let ledger = Ledger::open(dir.path(), Standardizer::default()).expect("open");
        let (_, created) = ledger.production().upsert(&reading).expect("store");
        assert!(created);
        ledger.flush().expect("flush");
    }

    let ledger = Ledger::open(dir.path(), Standardizer::default()).expect("reopen");
    let record = ledger
        .production()
        .get("W-1", d(3, 15))
        .expect("get")
        .expect("present");
    assert_eq!(record.standardized.net_oil_volume, 95.0);
    assert_eq!(record.standardized.water_cut, 20.83);
    assert_eq!(record.standardized.production_efficiency, 83.33);
}
