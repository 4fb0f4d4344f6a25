//! Readings and their standardized records
//!
//! A reading and its derived record are always written and removed together
//! in one sled transaction, so neither is ever observed without the other.

use chrono::NaiveDate;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::Transactional;
use tracing::{debug, info};

use super::keys::{well_date_key, well_prefix};
use super::StorageError;
use crate::standardization::Standardizer;
use crate::types::{ProductionReading, ProductionRecord, StandardizedProduction};

#[derive(Clone)]
pub struct ProductionStore {
    readings: sled::Tree,
    standardized: sled::Tree,
    standardizer: Standardizer,
}

fn transaction_error(err: TransactionError<StorageError>) -> StorageError {
    match err {
        TransactionError::Storage(e) => e.into(),
        TransactionError::Abort(e) => e,
    }
}

fn abort(err: serde_json::Error) -> ConflictableTransactionError<StorageError> {
    ConflictableTransactionError::Abort(err.into())
}

impl ProductionStore {
    pub(crate) fn new(
        readings: sled::Tree,
        standardized: sled::Tree,
        standardizer: Standardizer,
    ) -> Self {
        Self {
            readings,
            standardized,
            standardizer,
        }
    }

    /// Create or replace the reading for its (well, date) and recompute
    /// the standardized record.
    ///
    /// Returns the stored pair and whether the reading was new.
    pub fn upsert(
        &self,
        reading: &ProductionReading,
    ) -> Result<(ProductionRecord, bool), StorageError> {
        reading.validate()?;
        let standardized = self.standardizer.standardize(reading);

        let key = well_date_key(&reading.well_id, reading.production_date)?;
        let reading_bytes = serde_json::to_vec(reading)?;
        let derived_bytes = serde_json::to_vec(&standardized)?;

        let created = (&self.readings, &self.standardized)
            .transaction(|(readings, derived)| -> ConflictableTransactionResult<bool, StorageError> {
                let previous = readings.insert(key.as_slice(), reading_bytes.as_slice())?;
                derived.insert(key.as_slice(), derived_bytes.as_slice())?;
                Ok(previous.is_none())
            })
            .map_err(transaction_error)?;

        debug!(
            well = %reading.well_id,
            date = %reading.production_date,
            created,
            net_oil = standardized.net_oil_volume,
            water_cut = standardized.water_cut,
            "Reading standardized and stored"
        );

        Ok((
            ProductionRecord {
                reading: reading.clone(),
                standardized,
            },
            created,
        ))
    }

    pub fn get(
        &self,
        well_id: &str,
        date: NaiveDate,
    ) -> Result<Option<ProductionRecord>, StorageError> {
        let key = well_date_key(well_id, date)?;
        let (Some(reading), Some(derived)) = (self.readings.get(&key)?, self.standardized.get(&key)?)
        else {
            return Ok(None);
        };

        Ok(Some(ProductionRecord {
            reading: serde_json::from_slice(&reading)?,
            standardized: serde_json::from_slice(&derived)?,
        }))
    }

    /// Delete a reading and its standardized record. Returns whether it existed.
    pub fn delete(&self, well_id: &str, date: NaiveDate) -> Result<bool, StorageError> {
        let key = well_date_key(well_id, date)?;

        let existed = (&self.readings, &self.standardized)
            .transaction(|(readings, derived)| -> ConflictableTransactionResult<bool, StorageError> {
                let previous = readings.remove(key.as_slice())?;
                derived.remove(key.as_slice())?;
                Ok(previous.is_some())
            })
            .map_err(transaction_error)?;

        if existed {
            debug!(well = %well_id, date = %date, "Reading deleted");
        }
        Ok(existed)
    }

    /// All records for a well, oldest first.
    pub fn list_for_well(&self, well_id: &str) -> Result<Vec<ProductionRecord>, StorageError> {
        let mut records = Vec::new();
        for item in self.readings.scan_prefix(well_prefix(well_id)?) {
            let (key, value) = item?;
            let reading: ProductionReading = serde_json::from_slice(&value)?;
            let standardized: StandardizedProduction = match self.standardized.get(&key)? {
                Some(derived) => serde_json::from_slice(&derived)?,
                None => self.standardizer.standardize(&reading),
            };
            records.push(ProductionRecord {
                reading,
                standardized,
            });
        }
        Ok(records)
    }

    /// Recompute every standardized record with the current standardizer.
    ///
    /// Used after standard conditions or rounding change. Returns the number
    /// of records rewritten.
    pub fn restandardize_all(&self) -> Result<usize, StorageError> {
        let mut rewritten = 0;
        for key in self.readings.iter().keys() {
            if self.restandardize(&key?)? {
                rewritten += 1;
            }
        }

        info!(rewritten, "Standardized records recomputed");
        Ok(rewritten)
    }

    /// Recompute the standardized record for the reading stored under `key`.
    ///
    /// The read and the write share one transaction with `upsert` and
    /// `delete`. Returns false when no reading is stored under `key`.
    fn restandardize(&self, key: &[u8]) -> Result<bool, StorageError> {
        (&self.readings, &self.standardized)
            .transaction(|(readings, derived)| -> ConflictableTransactionResult<bool, StorageError> {
                let Some(value) = readings.get(key)? else {
                    return Ok(false);
                };
                let reading: ProductionReading = serde_json::from_slice(&value).map_err(abort)?;
                let bytes =
                    serde_json::to_vec(&self.standardizer.standardize(&reading)).map_err(abort)?;
                derived.insert(key, bytes)?;
                Ok(true)
            })
            .map_err(transaction_error)
    }

    pub fn count(&self) -> usize {
        self.readings.len()
    }
}
