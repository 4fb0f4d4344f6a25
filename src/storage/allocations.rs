//! Allocation batches, one per (date, facility, method)
//!
//! A batch and its well children are serialized as a single value, so a
//! save is atomic without a multi-tree transaction.

use chrono::NaiveDate;
use tracing::info;

use super::keys::{allocation_key, date_key};
use super::StorageError;
use crate::types::{AllocationBatch, AllocationMethod};

#[derive(Clone)]
pub struct AllocationStore {
    tree: sled::Tree,
}

impl AllocationStore {
    pub(crate) fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    /// Store a new batch. Fails with `Duplicate` if one exists for its
    /// (date, facility, method).
    pub fn save(&self, batch: &AllocationBatch) -> Result<(), StorageError> {
        let key = allocation_key(batch.allocation_date, &batch.facility_id, batch.method)?;
        let value = serde_json::to_vec(batch)?;

        if self
            .tree
            .compare_and_swap(key, None as Option<&[u8]>, Some(value))?
            .is_err()
        {
            return Err(StorageError::Duplicate(format!(
                "{} allocation for {} on {}",
                batch.method, batch.facility_id, batch.allocation_date
            )));
        }

        info!(
            facility = %batch.facility_id,
            date = %batch.allocation_date,
            method = %batch.method,
            wells = batch.wells.len(),
            "Allocation saved"
        );
        Ok(())
    }

    /// Store a batch, overwriting any existing one. Returns whether one was replaced.
    pub fn replace(&self, batch: &AllocationBatch) -> Result<bool, StorageError> {
        let key = allocation_key(batch.allocation_date, &batch.facility_id, batch.method)?;
        let previous = self.tree.insert(key, serde_json::to_vec(batch)?)?;

        info!(
            facility = %batch.facility_id,
            date = %batch.allocation_date,
            method = %batch.method,
            replaced = previous.is_some(),
            "Allocation stored"
        );
        Ok(previous.is_some())
    }

    pub fn get(
        &self,
        date: NaiveDate,
        facility_id: &str,
        method: AllocationMethod,
    ) -> Result<Option<AllocationBatch>, StorageError> {
        match self.tree.get(allocation_key(date, facility_id, method)?)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Every batch on a date, ordered by facility then method.
    pub fn list_for_date(&self, date: NaiveDate) -> Result<Vec<AllocationBatch>, StorageError> {
        self.tree
            .scan_prefix(date_key(date))
            .map(|item| -> Result<AllocationBatch, StorageError> {
                let (_key, value) = item?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    pub fn delete(
        &self,
        date: NaiveDate,
        facility_id: &str,
        method: AllocationMethod,
    ) -> Result<bool, StorageError> {
        Ok(self
            .tree
            .remove(allocation_key(date, facility_id, method)?)?
            .is_some())
    }

    pub fn count(&self) -> usize {
        self.tree.len()
    }
}
