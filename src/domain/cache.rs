use crate::domain::error::WizardError;
use crate::domain::model::{AnalysisRecord, DayTradingResult, MarketScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const GLOBAL_MARKET_KEY: &str = "GLOBAL_MARKET";
pub const GLOBAL_DAY_TRADING_KEY: &str = "GLOBAL_DAY_TRADING";

/// Address of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    GlobalMarket,
    GlobalDayTrading,
    Subject(String),
}

impl CacheKey {
    /// Trims and uppercases a raw identifier. Empty input and identifiers that
    /// would collide with a global key are rejected.
    pub fn subject(raw: &str) -> Result<Self, WizardError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty()
            || normalized == GLOBAL_MARKET_KEY
            || normalized == GLOBAL_DAY_TRADING_KEY
        {
            return Err(WizardError::InvalidSubject(raw.to_string()));
        }
        Ok(CacheKey::Subject(normalized))
    }

    /// Inverse of [`CacheKey::as_str`], used when reading a persisted blob.
    pub fn from_stored(stored: &str) -> Self {
        match stored {
            GLOBAL_MARKET_KEY => CacheKey::GlobalMarket,
            GLOBAL_DAY_TRADING_KEY => CacheKey::GlobalDayTrading,
            other => CacheKey::Subject(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CacheKey::GlobalMarket => GLOBAL_MARKET_KEY,
            CacheKey::GlobalDayTrading => GLOBAL_DAY_TRADING_KEY,
            CacheKey::Subject(ticker) => ticker,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached value. The variant is implied by the key it is stored under.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CachePayload {
    MarketScan(MarketScanResult),
    DayTrading(DayTradingResult),
    Analysis(AnalysisRecord),
}

impl CachePayload {
    /// Decodes a stored `state` value as the variant `key` holds.
    pub fn decode(key: &CacheKey, state: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match key {
            CacheKey::GlobalMarket => CachePayload::MarketScan(serde_json::from_value(state)?),
            CacheKey::GlobalDayTrading => CachePayload::DayTrading(serde_json::from_value(state)?),
            CacheKey::Subject(_) => CachePayload::Analysis(serde_json::from_value(state)?),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CachePayload::MarketScan(_) => "market-scan",
            CachePayload::DayTrading(_) => "day-trading",
            CachePayload::Analysis(_) => "analysis",
        }
    }
}

/// Timestamped snapshot. Replaced on write, never edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Epoch millis of the write that produced `state`.
    pub timestamp: i64,
    pub state: CachePayload,
}

impl CacheEntry {
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.timestamp)
    }

    /// Younger than `window_millis` at `now_millis`. Entries stamped in the
    /// future count as fresh.
    pub fn is_fresh(&self, now_millis: i64, window_millis: i64) -> bool {
        self.age_millis(now_millis) < window_millis
    }
}

/// On-disk shape of an entry before its payload is resolved.
#[derive(Debug, Deserialize)]
pub(crate) struct StoredEntry {
    pub timestamp: i64,
    pub state: serde_json::Value,
}
