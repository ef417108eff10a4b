use crate::application::cache_store::{window_millis, CacheStore};
use crate::domain::cache::{CacheKey, CachePayload};
use crate::domain::error::WizardError;
use crate::domain::model::{AnalysisRecord, DayTradingResult, FieldUpdate};
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of a subject switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub key: CacheKey,
    pub cache_hit: bool,
}

/// Where a batch of updates ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Written into the active record and its cache entry.
    Active,
    /// Written only into the cache entry of a subject that is no longer active.
    Background,
}

/// Owns the active record and keeps its cache entry in step with it.
pub struct SubjectController {
    store: CacheStore,
    record: AnalysisRecord,
    active: Option<CacheKey>,
    subject_window: Duration,
}

impl SubjectController {
    pub fn new(store: CacheStore, subject_window: Duration) -> Self {
        Self {
            store,
            record: AnalysisRecord::default(),
            active: None,
            subject_window,
        }
    }

    pub fn record(&self) -> &AnalysisRecord {
        &self.record
    }

    pub fn active_key(&self) -> Option<&CacheKey> {
        self.active.as_ref()
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CacheStore {
        &mut self.store
    }

    /// The shared day-trading result. Read from the global entry so it is the
    /// same under every subject.
    pub fn day_trading(&self) -> Option<&DayTradingResult> {
        match self.store.get(&CacheKey::GlobalDayTrading) {
            Some(entry) => match &entry.state {
                CachePayload::DayTrading(result) => Some(result),
                _ => None,
            },
            None => self.record.day_trading_result.as_ref(),
        }
    }

    /// Makes `raw` the active subject.
    ///
    /// A cached record younger than the subject window is restored as is;
    /// anything else starts an empty record for the subject.
    pub fn select_subject(&mut self, raw: &str) -> Result<Selection, WizardError> {
        let key = CacheKey::subject(raw)?;
        let cached = self.fresh_record(&key);
        let cache_hit = cached.is_some();

        self.record = cached.unwrap_or_else(|| AnalysisRecord::new(key.as_str()));
        self.active = Some(key.clone());

        if cache_hit {
            info!(subject = %key, "restored cached analysis");
        } else {
            debug!(subject = %key, "no fresh cache entry, starting empty");
        }
        Ok(Selection { key, cache_hit })
    }

    /// Applies one mutation to the active record and persists the full
    /// snapshot. The day-trading result is stored under the global key.
    pub async fn update_field(&mut self, update: FieldUpdate) -> Result<(), WizardError> {
        if update.is_global() {
            update.apply(&mut self.record);
            let result = self.record.day_trading_result.clone().unwrap_or_default();
            return self
                .store
                .put(CacheKey::GlobalDayTrading, CachePayload::DayTrading(result))
                .await;
        }

        let key = self.active.clone().ok_or(WizardError::NoSubject)?;
        debug!(subject = %key, field = update.field_name(), "field updated");
        update.apply(&mut self.record);
        self.store
            .put(key, CachePayload::Analysis(self.record.clone()))
            .await
    }

    /// Routes updates captured for `subject`: into the active record when it
    /// is still active, otherwise into that subject's cache entry only.
    ///
    /// The whole batch is applied before one snapshot is persisted, so a
    /// persistence error never leaves a half-applied record.
    pub async fn apply_updates(
        &mut self,
        subject: &CacheKey,
        updates: Vec<FieldUpdate>,
    ) -> Result<Applied, WizardError> {
        if self.active.as_ref() != Some(subject) {
            self.write_background(subject, updates).await?;
            return Ok(Applied::Background);
        }

        let (global, local): (Vec<_>, Vec<_>) =
            updates.into_iter().partition(FieldUpdate::is_global);
        let mut first_error = None;

        for update in global {
            if let Err(e) = self.update_field(update).await {
                first_error.get_or_insert(e);
            }
        }
        if !local.is_empty() {
            for update in local {
                debug!(subject = %subject, field = update.field_name(), "field updated");
                update.apply(&mut self.record);
            }
            if let Err(e) = self
                .store
                .put(subject.clone(), CachePayload::Analysis(self.record.clone()))
                .await
            {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(Applied::Active),
        }
    }

    /// Applies updates to a non-active subject's cached record (or a fresh
    /// empty one) and persists it once, leaving the active record alone.
    pub async fn write_background(
        &mut self,
        subject: &CacheKey,
        updates: Vec<FieldUpdate>,
    ) -> Result<(), WizardError> {
        let mut record = self
            .fresh_record(subject)
            .unwrap_or_else(|| AnalysisRecord::new(subject.as_str()));
        let (global, local): (Vec<_>, Vec<_>) =
            updates.into_iter().partition(FieldUpdate::is_global);
        let mut first_error = None;

        for update in global {
            if let Err(e) = self.update_field(update).await {
                first_error.get_or_insert(e);
            }
        }
        if !local.is_empty() {
            for update in local {
                info!(subject = %subject, field = update.field_name(), "background write");
                update.apply(&mut record);
            }
            if let Err(e) = self
                .store
                .put(subject.clone(), CachePayload::Analysis(record))
                .await
            {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fresh_record(&self, key: &CacheKey) -> Option<AnalysisRecord> {
        let entry = self.store.get(key)?;
        if !entry.is_fresh(self.store.now_millis(), window_millis(self.subject_window)) {
            return None;
        }
        match &entry.state {
            CachePayload::Analysis(record) => Some(record.clone()),
            _ => None,
        }
    }
}
