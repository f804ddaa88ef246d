//! Value encoding for store records and id sets.

use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(value).map_err(|e| StorageError::Encode {
        what,
        message: e.to_string(),
    })
}

pub fn decode<T: DeserializeOwned>(what: &'static str, bytes: &[u8]) -> Result<T, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Decode {
        what,
        message: e.to_string(),
    })
}
