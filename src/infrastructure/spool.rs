//! Research results handed over through a spool directory.
//!
//! An external inference worker writes one file per stage:
//!
//! ```text
//! <spool>/market-scan.json
//! <spool>/day-trading.json
//! <spool>/<SUBJECT>/financials.md
//! <spool>/<SUBJECT>/sentiment.json
//! <spool>/<SUBJECT>/peer-screen.md
//! <spool>/<SUBJECT>/legends.json
//! <spool>/<SUBJECT>/strategy.md
//! ```
//!
//! Text stages are read verbatim, structured stages as JSON in the stage's
//! result shape. A missing file is a failed call.

use crate::domain::error::WizardError;
use crate::domain::model::{
    AnalysisRecord, DayTradingResult, LegendReport, MarketScanResult, Quote, SentimentReport,
};
use crate::domain::stage::Stage;
use crate::domain::traits::ResearchService;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct SpoolResearchService {
    root: PathBuf,
}

impl SpoolResearchService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn global_path(&self, stage: Stage) -> PathBuf {
        self.root.join(format!("{}.json", stage.slug()))
    }

    fn subject_path(&self, subject: &str, stage: Stage, ext: &str) -> Result<PathBuf, WizardError> {
        if subject.is_empty()
            || subject.contains(&['/', '\\'][..])
            || subject == "."
            || subject == ".."
        {
            return Err(WizardError::InvalidSubject(subject.to_string()));
        }
        Ok(self
            .root
            .join(subject)
            .join(format!("{}.{}", stage.slug(), ext)))
    }

    async fn read_text(&self, path: &Path, stage: Stage) -> Result<String, WizardError> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(WizardError::Research(format!(
                "no {} result spooled at {}",
                stage,
                path.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        path: &Path,
        stage: Stage,
    ) -> Result<T, WizardError> {
        let text = self.read_text(path, stage).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn log_quote(subject: &str, quote: Option<&Quote>) {
    if let Some(q) = quote {
        debug!(subject, price = q.price, change_rate = q.change_rate, "quote attached");
    }
}

#[async_trait]
impl ResearchService for SpoolResearchService {
    async fn market_scan(&self) -> Result<MarketScanResult, WizardError> {
        let path = self.global_path(Stage::MarketScan);
        self.read_json(&path, Stage::MarketScan).await
    }

    async fn day_trading_scan(&self) -> Result<DayTradingResult, WizardError> {
        let path = self.global_path(Stage::DayTradingScan);
        self.read_json(&path, Stage::DayTradingScan).await
    }

    async fn financials(
        &self,
        subject: &str,
        quote: Option<&Quote>,
    ) -> Result<String, WizardError> {
        log_quote(subject, quote);
        let path = self.subject_path(subject, Stage::Financials, "md")?;
        self.read_text(&path, Stage::Financials).await
    }

    async fn sentiment(&self, subject: &str) -> Result<SentimentReport, WizardError> {
        let path = self.subject_path(subject, Stage::Sentiment, "json")?;
        self.read_json(&path, Stage::Sentiment).await
    }

    async fn peer_screen(&self, subject: &str) -> Result<String, WizardError> {
        let path = self.subject_path(subject, Stage::PeerScreen, "md")?;
        self.read_text(&path, Stage::PeerScreen).await
    }

    async fn legends(
        &self,
        subject: &str,
        quote: Option<&Quote>,
    ) -> Result<LegendReport, WizardError> {
        log_quote(subject, quote);
        let path = self.subject_path(subject, Stage::LegendPanel, "json")?;
        self.read_json(&path, Stage::LegendPanel).await
    }

    async fn strategy(
        &self,
        subject: &str,
        record: &AnalysisRecord,
        quote: Option<&Quote>,
    ) -> Result<String, WizardError> {
        log_quote(subject, quote);
        debug!(
            subject,
            sentiment = record.sentiment_score,
            legend_total = record.legend_scores.total,
            "strategy context"
        );
        let path = self.subject_path(subject, Stage::Strategy, "md")?;
        self.read_text(&path, Stage::Strategy).await
    }
}
