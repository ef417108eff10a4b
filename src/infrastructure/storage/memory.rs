// In-memory blob store using DashMap
use crate::domain::error::WizardError;
use crate::domain::traits::BlobStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Thread-safe in-memory stand-in for the durable store.
///
/// `fail_writes` makes every write return an error, for exercising the
/// persistence-failure paths.
#[derive(Default)]
pub struct MemoryBlobStore {
    map: DashMap<String, Vec<u8>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a namespace with raw bytes, as if written by an earlier run.
    pub fn with_blob(namespace: &str, data: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.map.insert(namespace.to_string(), data.into());
        store
    }

    pub fn get(&self, namespace: &str) -> Option<Vec<u8>> {
        self.map.get(namespace).map(|entry| entry.value().clone())
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, namespace: &str) -> Result<Option<Vec<u8>>, WizardError> {
        Ok(self.get(namespace))
    }

    async fn write(&self, namespace: &str, data: Vec<u8>) -> Result<(), WizardError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(WizardError::Io(std::io::Error::other("write rejected")));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.map.insert(namespace.to_string(), data);
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<(String, i64)>, WizardError> {
        let mut names: Vec<(String, i64)> =
            self.map.iter().map(|entry| (entry.key().clone(), 0)).collect();
        names.sort();
        Ok(names)
    }
}
