use crate::domain::cache::{CacheEntry, CacheKey, CachePayload, StoredEntry};
use crate::domain::error::WizardError;
use crate::domain::traits::{BlobStore, Clock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub(crate) fn window_millis(window: Duration) -> i64 {
    window.as_millis().min(i64::MAX as u128) as i64
}

/// Every cached snapshot, keyed by subject or global key.
///
/// The whole mapping is written back on every `put`; there is no partial
/// write. Expiry happens only when the store is loaded.
pub struct CacheStore {
    backend: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    namespace: String,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl CacheStore {
    /// Reads the namespace's blob and drops entries at least `prune_window`
    /// old. Unreadable data yields an empty store.
    pub async fn load(
        backend: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        namespace: impl Into<String>,
        prune_window: Duration,
    ) -> Self {
        let namespace = namespace.into();
        let now = clock.now_millis();

        let entries = match backend.read(&namespace).await {
            Ok(Some(bytes)) => decode_entries(&bytes, now, window_millis(prune_window)),
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "cache read failed, starting empty");
                HashMap::new()
            }
        };

        debug!(namespace = %namespace, entries = entries.len(), "cache loaded");
        Self {
            backend,
            clock,
            namespace,
            entries,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> &HashMap<CacheKey, CacheEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the entry under `key` exists and is younger than `window`.
    pub fn is_fresh(&self, key: &CacheKey, window: Duration) -> bool {
        self.get(key)
            .map(|entry| entry.is_fresh(self.now_millis(), window_millis(window)))
            .unwrap_or(false)
    }

    /// Stamps `payload` with the current time, replaces whatever `key` held
    /// and persists the full mapping. On a persistence error the new entry
    /// stays in memory.
    pub async fn put(&mut self, key: CacheKey, payload: CachePayload) -> Result<(), WizardError> {
        let entry = CacheEntry {
            timestamp: self.clock.now_millis(),
            state: payload,
        };
        debug!(key = %key, kind = entry.state.kind(), "cache put");
        self.entries.insert(key, entry);
        self.persist().await
    }

    pub async fn persist(&self) -> Result<(), WizardError> {
        let blob = self.encode()?;
        self.backend.write(&self.namespace, blob).await
    }

    /// `{ "<key>": { "timestamp": <millis>, "state": <payload> } }`
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        let ordered: BTreeMap<&str, &CacheEntry> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
            .collect();
        serde_json::to_vec(&ordered)
    }
}

/// Parses a persisted blob and keeps entries younger than `prune_millis`.
///
/// A blob that is not a JSON object of entries gives an empty mapping. An
/// entry whose payload does not fit its key is dropped on its own.
pub fn decode_entries(bytes: &[u8], now: i64, prune_millis: i64) -> HashMap<CacheKey, CacheEntry> {
    let stored: HashMap<String, StoredEntry> = match serde_json::from_slice(bytes) {
        Ok(stored) => stored,
        Err(e) => {
            warn!(error = %e, "cache blob unreadable, starting empty");
            return HashMap::new();
        }
    };

    let mut entries = HashMap::with_capacity(stored.len());
    for (raw_key, raw) in stored {
        let key = CacheKey::from_stored(&raw_key);
        let age = now.saturating_sub(raw.timestamp);
        if age >= prune_millis {
            debug!(key = %key, age_ms = age, "pruned expired entry");
            continue;
        }
        match CachePayload::decode(&key, raw.state) {
            Ok(state) => {
                entries.insert(
                    key,
                    CacheEntry {
                        timestamp: raw.timestamp,
                        state,
                    },
                );
            }
            Err(e) => warn!(key = %key, error = %e, "dropping undecodable entry"),
        }
    }
    entries
}
