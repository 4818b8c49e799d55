//! In-memory record source.
//!
//! Backs guards in embedding hosts and tests where no database is wanted.
//! Records live in a concurrent in-process table; lookups scan in insertion
//! order, matching the "first record wins" contract.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use super::RecordSource;
use crate::errors::AuthResult;
use crate::record::{FieldMap, Fields, UserRecord};

/// Concurrent in-process record store
#[derive(Debug, Default)]
pub struct MemoryRecordSource {
    records: RwLock<Vec<UserRecord>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record at the end of the scan order
    pub fn insert(&self, record: UserRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with_record(self, record: UserRecord) -> Self {
        self.insert(record);
        self
    }

    /// Delete every record whose `field` equals `value`, returning the count
    pub fn remove_by(&self, field: &str, value: &Value) -> usize {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|record| record.get(field) != Some(value));
        before - records.len()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn find_by(&self, filters: &FieldMap) -> AuthResult<Option<UserRecord>> {
        let records = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        Ok(records
            .iter()
            .find(|record| {
                filters
                    .iter()
                    .all(|(name, value)| record.field(name) == Some(value))
            })
            .cloned())
    }
}
