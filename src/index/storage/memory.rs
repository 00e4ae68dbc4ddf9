//! In-memory index storage
//!
//! Backend for ephemeral runs and tests. Supports fault injection so the
//! task's abort-on-storage-failure path can be exercised without a real
//! disk fault.
#![allow(dead_code)]

use super::{IndexError, IndexStorage};
use crate::index::location::IndexFileLocation;
use crate::index::record::FileRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Map-backed storage with optional fault injection
#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<IndexFileLocation, FileRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent put/remove fail with a storage fault
    pub fn inject_write_fault(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_write_fault(&self) -> Result<(), IndexError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(IndexError::Fault("injected write fault".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IndexStorage for MemoryStorage {
    async fn get(&self, location: &IndexFileLocation) -> Result<Option<FileRecord>, IndexError> {
        Ok(self.records.lock().unwrap().get(location).cloned())
    }

    async fn put(&self, record: FileRecord) -> Result<(), IndexError> {
        self.check_write_fault()?;
        self.records
            .lock()
            .unwrap()
            .insert(record.location.clone(), record);
        Ok(())
    }

    async fn remove(&self, location: &IndexFileLocation) -> Result<bool, IndexError> {
        self.check_write_fault()?;
        Ok(self.records.lock().unwrap().remove(location).is_some())
    }

    async fn locations(&self) -> Result<Vec<IndexFileLocation>, IndexError> {
        Ok(self.records.lock().unwrap().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::record::Fingerprint;
    use crate::io::file_system::FileMetadata;
    use std::time::UNIX_EPOCH;

    fn record(path: &str) -> FileRecord {
        let metadata = FileMetadata::new(UNIX_EPOCH, 0);
        FileRecord::new(
            IndexFileLocation::from_normalized(path),
            Fingerprint::of(&metadata, ""),
            vec![],
            vec![],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_round_trip() {
        let storage = MemoryStorage::new();
        let rec = record("/p/a.cpp");

        storage.put(rec.clone()).await.unwrap();
        assert_eq!(storage.get(&rec.location).await.unwrap(), Some(rec.clone()));
        assert!(storage.remove(&rec.location).await.unwrap());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_injected_fault_fails_writes_not_reads() {
        let storage = MemoryStorage::new();
        let rec = record("/p/a.cpp");
        storage.put(rec.clone()).await.unwrap();

        storage.inject_write_fault(true);
        assert!(storage.put(record("/p/b.cpp")).await.is_err());
        assert!(storage.remove(&rec.location).await.is_err());
        // Reads still see the committed record.
        assert!(storage.get(&rec.location).await.unwrap().is_some());

        storage.inject_write_fault(false);
        assert!(storage.put(record("/p/b.cpp")).await.is_ok());
    }
}
