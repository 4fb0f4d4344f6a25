//! PetroFlow - production standardization and allocation
//!
//! Command-line front end over the `petroflow` library. Inputs and outputs
//! are JSON; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Standardize a file of readings (prints records, does not store)
//! petroflow standardize --input readings.json
//!
//! # Standardize and persist into the ledger
//! petroflow standardize --input readings.json --store
//!
//! # Record a well test, then allocate a facility total by test rates
//! petroflow record-test --well W-1 --date 2024-03-01 --oil 50 --gas 120 --water 10
//! petroflow allocate --facility CPF-1 --date 2024-03-15 --method test_based \
//!     --oil 600 --gas 1500 --water 200 --wells wells.json --store
//! ```
//!
//! # Environment Variables
//!
//! - `PETROFLOW_CONFIG`: Path to engine config TOML (default: ./petroflow.toml)
//! - `PETROFLOW_DATA_DIR`: Ledger directory (default: storage.data_dir)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use petroflow::config::{self, EngineConfig};
use petroflow::standardization::{AdvancedInput, AdvancedStandardizer, Standardizer};
use petroflow::storage::Ledger;
use petroflow::{
    AllocationMethod, AllocationRequest, Allocator, FacilityTotals, ProductionReading,
    ProductionRecord, StreamRates, WellAllocationInput, WellTestRate,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "petroflow")]
#[command(about = "Production volume standardization and allocation engine")]
#[command(version)]
struct CliArgs {
    /// Engine config TOML (overrides PETROFLOW_CONFIG and ./petroflow.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ledger directory (overrides storage.data_dir)
    #[arg(long, global = true, env = "PETROFLOW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Standardize a JSON array of daily readings
    Standardize {
        /// Path to the readings file
        #[arg(long)]
        input: PathBuf,
        /// Persist readings and standardized records into the ledger
        #[arg(long)]
        store: bool,
    },

    /// Run the VCF/shrinkage correction chain on a JSON array of inputs
    Correct {
        /// Path to the inputs file
        #[arg(long)]
        input: PathBuf,
    },

    /// Record a well test into the ledger
    RecordTest {
        #[arg(long)]
        well: String,
        /// Test date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "0")]
        oil: f64,
        #[arg(long, default_value = "0")]
        gas: f64,
        #[arg(long, default_value = "0")]
        water: f64,
    },

    /// Allocate facility totals across wells
    Allocate {
        #[arg(long)]
        facility: String,
        /// Allocation date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// manual, test_based, pro_rata or potential_based
        #[arg(long)]
        method: AllocationMethod,
        #[arg(long, default_value = "0")]
        oil: f64,
        #[arg(long, default_value = "0")]
        gas: f64,
        #[arg(long, default_value = "0")]
        water: f64,
        /// JSON array of per-well inputs
        #[arg(long)]
        wells: PathBuf,
        /// Persist the batch into the ledger
        #[arg(long)]
        store: bool,
        /// Overwrite an existing batch for the same date, facility and method
        #[arg(long, requires = "store")]
        replace: bool,
    },

    /// Print stored allocations for a date
    ShowAllocation {
        /// Allocation date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Only this facility
        #[arg(long)]
        facility: Option<String>,
    },

    /// Print stored records for a well
    ShowWell {
        #[arg(long)]
        well: String,
    },

    /// Delete a reading and its standardized record
    DeleteReading {
        #[arg(long)]
        well: String,
        /// Production date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },

    /// Recompute every stored standardized record with the current config
    Restandardize,

    /// Validate a config file and print the effective configuration
    CheckConfig,
}

// ============================================================================
// Helpers
// ============================================================================

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => EngineConfig::try_load().context("Failed to load engine config"),
    }
}

fn open_ledger(data_dir: &Path) -> Result<Ledger> {
    let config = config::get();
    Ledger::open(data_dir, Standardizer::from_config(config))
        .with_context(|| format!("Failed to open ledger at {}", data_dir.display()))
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let engine_config = load_config(args.config.as_deref())?;
    info!(
        facility = %engine_config.facility.name,
        base_temperature_f = engine_config.standard_conditions.temperature_f,
        base_pressure_psia = engine_config.standard_conditions.pressure_psia,
        decimals = engine_config.rounding.decimals,
        "Engine configured"
    );
    config::init(engine_config);
    let config = config::get();

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config.storage.data_dir.clone());

    match args.command {
        SubCommand::Standardize { input, store } => {
            let readings: Vec<ProductionReading> = read_json(&input)?;
            let records = if store {
                let ledger = open_ledger(&data_dir)?;
                let mut records = Vec::with_capacity(readings.len());
                for reading in &readings {
                    let (record, _created) = ledger.production().upsert(reading).with_context(|| {
                        format!("Failed to store {} on {}", reading.well_id, reading.production_date)
                    })?;
                    records.push(record);
                }
                ledger.flush()?;
                records
            } else {
                let standardizer = Standardizer::from_config(config);
                readings
                    .into_iter()
                    .map(|reading| -> Result<ProductionRecord> {
                        reading.validate().with_context(|| {
                            format!("Invalid reading {} on {}", reading.well_id, reading.production_date)
                        })?;
                        let standardized = standardizer.standardize(&reading);
                        Ok(ProductionRecord {
                            reading,
                            standardized,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
            };
            info!(records = records.len(), stored = store, "Readings standardized");
            print_json(&records)
        }

        SubCommand::Correct { input } => {
            let inputs: Vec<AdvancedInput> = read_json(&input)?;
            let pipeline = AdvancedStandardizer::from_config(config);
            let results = inputs
                .iter()
                .enumerate()
                .map(|(i, input)| {
                    pipeline
                        .run(input)
                        .with_context(|| format!("Correction failed for input #{i}"))
                })
                .collect::<Result<Vec<_>>>()?;
            print_json(&results)
        }

        SubCommand::RecordTest {
            well,
            date,
            oil,
            gas,
            water,
        } => {
            let ledger = open_ledger(&data_dir)?;
            let test = WellTestRate {
                well_id: well,
                test_date: date,
                rates: StreamRates::new(oil, gas, water),
            };
            ledger
                .well_tests()
                .record(&test)
                .context("Failed to record well test")?;
            ledger.flush()?;
            print_json(&test)
        }

        SubCommand::Allocate {
            facility,
            date,
            method,
            oil,
            gas,
            water,
            wells,
            store,
            replace,
        } => {
            let request = AllocationRequest {
                allocation_date: date,
                facility_id: facility,
                method,
                totals: FacilityTotals::new(oil, gas, water),
                wells: read_json::<Vec<WellAllocationInput>>(&wells)?,
            };
            let allocator = Allocator::from_config(config);

            // Only test_based needs the ledger for lookups
            let ledger = if store || method == AllocationMethod::TestBased {
                Some(open_ledger(&data_dir)?)
            } else {
                None
            };

            let batch = match &ledger {
                Some(ledger) => allocator.allocate_batch(&request, ledger.well_tests()).await?,
                None => {
                    allocator
                        .allocate_batch(&request, &petroflow::InMemoryWellTests::new())
                        .await?
                }
            };

            if let Some(ledger) = ledger.as_ref().filter(|_| store) {
                if replace {
                    ledger.allocations().replace(&batch)?;
                } else {
                    ledger
                        .allocations()
                        .save(&batch)
                        .context("Allocation already stored (use --replace to overwrite)")?;
                }
                ledger.flush()?;
            }
            print_json(&batch)
        }

        SubCommand::ShowAllocation { date, facility } => {
            let ledger = open_ledger(&data_dir)?;
            let batches: Vec<_> = ledger
                .allocations()
                .list_for_date(date)?
                .into_iter()
                .filter(|b| facility.as_deref().map_or(true, |f| b.facility_id == f))
                .collect();
            print_json(&batches)
        }

        SubCommand::ShowWell { well } => {
            let ledger = open_ledger(&data_dir)?;
            print_json(&ledger.production().list_for_well(&well)?)
        }

        SubCommand::DeleteReading { well, date } => {
            let ledger = open_ledger(&data_dir)?;
            let existed = ledger.production().delete(&well, date)?;
            ledger.flush()?;
            info!(well = %well, date = %date, existed, "Delete reading");
            print_json(&serde_json::json!({ "deleted": existed }))
        }

        SubCommand::Restandardize => {
            let ledger = open_ledger(&data_dir)?;
            let rewritten = ledger.production().restandardize_all()?;
            ledger.flush()?;
            print_json(&serde_json::json!({ "rewritten": rewritten }))
        }

        SubCommand::CheckConfig => {
            // load_config fails on any discovered file that does not load or validate
            println!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
