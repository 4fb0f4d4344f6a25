//! Sled key encoding

use chrono::{Datelike, NaiveDate};

use super::StorageError;
use crate::types::AllocationMethod;

const SEPARATOR: u8 = 0x00;

/// Days since CE, offset into u32 so the big-endian bytes sort by date.
pub(crate) fn date_key(date: NaiveDate) -> [u8; 4] {
    let offset = i64::from(date.num_days_from_ce()) - i64::from(i32::MIN);
    // offset is in [0, u32::MAX] for any i32 day count
    (offset as u32).to_be_bytes()
}

fn component(id: &str) -> Result<&[u8], StorageError> {
    if id.as_bytes().contains(&SEPARATOR) {
        return Err(StorageError::InvalidKey(format!("{id:?} contains a NUL byte")));
    }
    Ok(id.as_bytes())
}

/// `well ∅` - prefix of every per-well key.
pub(crate) fn well_prefix(well_id: &str) -> Result<Vec<u8>, StorageError> {
    let mut key = component(well_id)?.to_vec();
    key.push(SEPARATOR);
    Ok(key)
}

/// `well ∅ date`
pub(crate) fn well_date_key(well_id: &str, date: NaiveDate) -> Result<Vec<u8>, StorageError> {
    let mut key = well_prefix(well_id)?;
    key.extend_from_slice(&date_key(date));
    Ok(key)
}

/// `date facility ∅ method`
pub(crate) fn allocation_key(
    date: NaiveDate,
    facility_id: &str,
    method: AllocationMethod,
) -> Result<Vec<u8>, StorageError> {
    let mut key = date_key(date).to_vec();
    key.extend_from_slice(component(facility_id)?);
    key.push(SEPARATOR);
    key.extend_from_slice(method.as_str().as_bytes());
    Ok(key)
}
