use crate::domain::error::WizardError;
use crate::domain::model::{
    AnalysisRecord, DayTradingResult, LegendReport, MarketScanResult, Quote, SentimentReport,
};
use async_trait::async_trait;

/// Durable storage for whole serialized snapshots, one per namespace.
///
/// Writes replace the previous blob entirely.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn read(&self, namespace: &str) -> Result<Option<Vec<u8>>, WizardError>;

    async fn write(&self, namespace: &str, data: Vec<u8>) -> Result<(), WizardError>;

    /// Every namespace held by the store with its last write time (epoch millis).
    async fn namespaces(&self) -> Result<Vec<(String, i64)>, WizardError>;
}

/// Wall clock in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// The stage-specific inference calls.
///
/// Implementations may fail; the caller turns failures into a retryable
/// stage error.
#[async_trait]
pub trait ResearchService: Send + Sync {
    async fn market_scan(&self) -> Result<MarketScanResult, WizardError>;

    async fn day_trading_scan(&self) -> Result<DayTradingResult, WizardError>;

    async fn financials(&self, subject: &str, quote: Option<&Quote>)
        -> Result<String, WizardError>;

    async fn sentiment(&self, subject: &str) -> Result<SentimentReport, WizardError>;

    async fn peer_screen(&self, subject: &str) -> Result<String, WizardError>;

    async fn legends(&self, subject: &str, quote: Option<&Quote>)
        -> Result<LegendReport, WizardError>;

    /// `record` is the subject's state when the run started.
    async fn strategy(
        &self,
        subject: &str,
        record: &AnalysisRecord,
        quote: Option<&Quote>,
    ) -> Result<String, WizardError>;
}

/// Real-time quote lookup keyed by a 6-digit exchange code.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// `Ok(None)` when the code is unknown to the provider.
    async fn lookup(&self, code: &str) -> Result<Option<Quote>, WizardError>;
}
