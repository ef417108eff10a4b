use crate::domain::cache::CacheKey;
use crate::domain::error::WizardError;
use crate::domain::model::{AnalysisRecord, Quote, StageResult};
use crate::domain::stage::Stage;
use crate::domain::traits::{QuoteProvider, ResearchService};
use tracing::{debug, info, warn};

/// A stage run that has been started but not yet resolved.
///
/// It carries the subject it was started for, so the result can be routed
/// back to that subject whatever is active when it completes.
#[derive(Debug, Clone, PartialEq)]
pub struct StageRequest {
    pub stage: Stage,
    /// `None` for the global scans.
    pub subject: Option<CacheKey>,
    /// Record snapshot at start, for the strategy stage.
    pub context: Option<AnalysisRecord>,
}

#[derive(Debug)]
pub struct StageOutcome {
    pub stage: Stage,
    pub subject: Option<CacheKey>,
    pub result: Result<StageResult, WizardError>,
}

impl StageRequest {
    /// Calls the research service for this stage. Never fails itself: errors
    /// and unusable responses are carried in the outcome.
    pub async fn execute(
        self,
        research: &dyn ResearchService,
        quotes: &dyn QuoteProvider,
    ) -> StageOutcome {
        info!(stage = %self.stage, subject = ?self.subject.as_ref().map(CacheKey::as_str), "stage run started");

        let stage = self.stage;
        let result = self.call(research, quotes).await.and_then(|result| {
            result
                .check_usable()
                .map_err(|reason| WizardError::MalformedResponse { stage, reason })?;
            Ok(result)
        });

        StageOutcome {
            stage,
            subject: self.subject,
            result,
        }
    }

    async fn call(
        &self,
        research: &dyn ResearchService,
        quotes: &dyn QuoteProvider,
    ) -> Result<StageResult, WizardError> {
        let subject = || {
            self.subject
                .as_ref()
                .map(CacheKey::as_str)
                .ok_or(WizardError::NoSubject)
        };

        match self.stage {
            Stage::MarketScan => research.market_scan().await.map(StageResult::MarketScan),
            Stage::DayTradingScan => research
                .day_trading_scan()
                .await
                .map(StageResult::DayTrading),
            Stage::Financials => {
                let subject = subject()?;
                let quote = enrich(quotes, subject).await;
                research
                    .financials(subject, quote.as_ref())
                    .await
                    .map(StageResult::Financials)
            }
            Stage::Sentiment => research
                .sentiment(subject()?)
                .await
                .map(StageResult::Sentiment),
            Stage::PeerScreen => research
                .peer_screen(subject()?)
                .await
                .map(StageResult::PeerScreen),
            Stage::LegendPanel => {
                let subject = subject()?;
                let quote = enrich(quotes, subject).await;
                research
                    .legends(subject, quote.as_ref())
                    .await
                    .map(StageResult::Legends)
            }
            Stage::Strategy => {
                let subject = subject()?;
                let quote = enrich(quotes, subject).await;
                let context = self
                    .context
                    .clone()
                    .unwrap_or_else(|| AnalysisRecord::new(subject));
                research
                    .strategy(subject, &context, quote.as_ref())
                    .await
                    .map(StageResult::Strategy)
            }
        }
    }
}

/// Exchange codes are exactly six ASCII digits (e.g. `005930`).
pub fn is_quote_code(subject: &str) -> bool {
    subject.len() == 6 && subject.bytes().all(|b| b.is_ascii_digit())
}

// Quotes only enrich the request; no quote is never an error.
async fn enrich(quotes: &dyn QuoteProvider, subject: &str) -> Option<Quote> {
    if !is_quote_code(subject) {
        return None;
    }
    match quotes.lookup(subject).await {
        Ok(Some(quote)) => Some(quote),
        Ok(None) => {
            debug!(subject, "no quote for code");
            None
        }
        Err(e) => {
            warn!(subject, error = %e, "quote lookup failed, continuing without it");
            None
        }
    }
}
