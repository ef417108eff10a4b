//! Shared fakes for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use research_wizard::application::cache_store::CacheStore;
use research_wizard::application::wizard::Wizard;
use research_wizard::domain::error::WizardError;
use research_wizard::domain::model::{
    AnalysisRecord, Category, DayTradingResult, DayTradingStock, IndexColor, LegendReport,
    LegendScores, MarketIndex, MarketScanResult, Quote, ScanPick, SentimentReport,
};
use research_wizard::domain::traits::{QuoteProvider, ResearchService};
use research_wizard::infrastructure::clock::ManualClock;
use research_wizard::infrastructure::storage::memory::MemoryBlobStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const NAMESPACE: &str = "invest_ai_persistent_cache_v4";
pub const START_MILLIS: i64 = 1_700_000_000_000;

pub const PRUNE_WINDOW: Duration = Duration::from_secs(10 * 60);
pub const SUBJECT_WINDOW: Duration = Duration::from_secs(10 * 60);
pub const SCAN_WINDOW: Duration = Duration::from_secs(6 * 60 * 60);

pub async fn load_store(blobs: &Arc<MemoryBlobStore>, clock: &Arc<ManualClock>) -> CacheStore {
    CacheStore::load(blobs.clone(), clock.clone(), NAMESPACE, PRUNE_WINDOW).await
}

pub struct Harness {
    pub blobs: Arc<MemoryBlobStore>,
    pub clock: Arc<ManualClock>,
    pub research: FakeResearch,
    pub quotes: FakeQuotes,
    pub wizard: Wizard,
}

impl Harness {
    pub async fn new() -> Self {
        let blobs = Arc::new(MemoryBlobStore::new());
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let store = load_store(&blobs, &clock).await;
        Self {
            wizard: Wizard::new(store, SUBJECT_WINDOW, SCAN_WINDOW),
            blobs,
            clock,
            research: FakeResearch::default(),
            quotes: FakeQuotes::default(),
        }
    }

    /// Reloads the wizard from whatever the blob store holds now.
    pub async fn reload(&mut self) {
        let store = load_store(&self.blobs, &self.clock).await;
        self.wizard = Wizard::new(store, SUBJECT_WINDOW, SCAN_WINDOW);
    }
}

pub fn sample_scan() -> MarketScanResult {
    MarketScanResult {
        market_status: "Bull".to_string(),
        timing_score: 72,
        liquidity_comment: "Foreign buying".to_string(),
        summary: "Semiconductors lead".to_string(),
        indices: vec![MarketIndex {
            name: "KOSPI".to_string(),
            value: "2,650.12".to_string(),
            change: "+0.8%".to_string(),
            color: IndexColor::Red,
        }],
        leading_sectors: vec!["Semiconductors".to_string()],
        recommendations: vec![ScanPick {
            ticker: "005930".to_string(),
            name: "Samsung Electronics".to_string(),
            category: Category::BlueChip,
            sector: "Semiconductors".to_string(),
            current_price: "71,000".to_string(),
            reason: "HBM demand".to_string(),
        }],
    }
}

pub fn sample_day_trading() -> DayTradingResult {
    DayTradingResult {
        summary: "Two breakout candidates".to_string(),
        recommendations: vec![DayTradingStock {
            ticker: "000660".to_string(),
            name: "SK hynix".to_string(),
            category: Category::Growth,
            current_price: "180,000".to_string(),
            target_price: "186,000".to_string(),
            stop_loss: "176,000".to_string(),
            technical_analysis: String::new(),
            momentum: String::new(),
            indicators: Default::default(),
            larry_williams: Default::default(),
            fake_breakout_filters: Default::default(),
        }],
    }
}

/// Research service with canned answers and per-stage call counters.
#[derive(Default)]
pub struct FakeResearch {
    calls: Mutex<HashMap<&'static str, usize>>,
    fail: AtomicBool,
    blank: AtomicBool,
    quotes_seen: Mutex<Vec<Option<Quote>>>,
    strategy_context: Mutex<Option<AnalysisRecord>>,
}

impl FakeResearch {
    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Answer with empty content instead of failing outright.
    pub fn set_blank(&self, blank: bool) {
        self.blank.store(blank, Ordering::SeqCst);
    }

    pub fn quotes_seen(&self) -> Vec<Option<Quote>> {
        self.quotes_seen.lock().unwrap().clone()
    }

    pub fn strategy_context(&self) -> Option<AnalysisRecord> {
        self.strategy_context.lock().unwrap().clone()
    }

    fn hit(&self, name: &'static str) -> Result<bool, WizardError> {
        *self.calls.lock().unwrap().entry(name).or_insert(0) += 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(WizardError::Research(format!("{} unavailable", name)));
        }
        Ok(self.blank.load(Ordering::SeqCst))
    }

    fn text(&self, name: &'static str, subject: &str) -> Result<String, WizardError> {
        if self.hit(name)? {
            return Ok("   ".to_string());
        }
        Ok(format!("{} for {}", name, subject))
    }
}

#[async_trait]
impl ResearchService for FakeResearch {
    async fn market_scan(&self) -> Result<MarketScanResult, WizardError> {
        if self.hit("market_scan")? {
            return Ok(MarketScanResult::default());
        }
        Ok(sample_scan())
    }

    async fn day_trading_scan(&self) -> Result<DayTradingResult, WizardError> {
        if self.hit("day_trading")? {
            return Ok(DayTradingResult::default());
        }
        Ok(sample_day_trading())
    }

    async fn financials(
        &self,
        subject: &str,
        quote: Option<&Quote>,
    ) -> Result<String, WizardError> {
        self.quotes_seen.lock().unwrap().push(quote.cloned());
        self.text("financials", subject)
    }

    async fn sentiment(&self, subject: &str) -> Result<SentimentReport, WizardError> {
        if self.hit("sentiment")? {
            return Ok(SentimentReport::default());
        }
        Ok(SentimentReport {
            summary: format!("sentiment for {}", subject),
            score: 64,
        })
    }

    async fn peer_screen(&self, subject: &str) -> Result<String, WizardError> {
        self.text("peer_screen", subject)
    }

    async fn legends(
        &self,
        subject: &str,
        quote: Option<&Quote>,
    ) -> Result<LegendReport, WizardError> {
        self.quotes_seen.lock().unwrap().push(quote.cloned());
        if self.hit("legends")? {
            return Ok(LegendReport::default());
        }
        Ok(LegendReport {
            analysis: format!("legends for {}", subject),
            scores: LegendScores {
                buffett: 80,
                lynch: 70,
                oneil: 60,
                total: 72,
            },
            insider_summary: "No insider selling".to_string(),
        })
    }

    async fn strategy(
        &self,
        subject: &str,
        record: &AnalysisRecord,
        quote: Option<&Quote>,
    ) -> Result<String, WizardError> {
        self.quotes_seen.lock().unwrap().push(quote.cloned());
        *self.strategy_context.lock().unwrap() = Some(record.clone());
        self.text("strategy", subject)
    }
}

/// Quote provider that either answers every code or fails every lookup.
#[derive(Default)]
pub struct FakeQuotes {
    lookups: AtomicUsize,
    fail: AtomicBool,
}

impl FakeQuotes {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuoteProvider for FakeQuotes {
    async fn lookup(&self, code: &str) -> Result<Option<Quote>, WizardError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(WizardError::Research("quote service down".to_string()));
        }
        Ok(Some(Quote {
            code: code.to_string(),
            name: "Samsung Electronics".to_string(),
            price: 71_000,
            change_amount: -900,
            change_rate: -1.25,
        }))
    }
}
