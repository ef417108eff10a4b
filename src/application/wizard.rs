use crate::application::cache_store::{window_millis, CacheStore};
use crate::application::pipeline::StageController;
use crate::application::run::{StageOutcome, StageRequest};
use crate::application::subject::{Applied, Selection, SubjectController};
use crate::domain::cache::{CacheKey, CachePayload};
use crate::domain::error::WizardError;
use crate::domain::model::{AnalysisRecord, DayTradingResult, FieldUpdate, MarketScanResult, StageResult};
use crate::domain::stage::Stage;
use crate::domain::traits::{QuoteProvider, ResearchService};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// What starting a run produced.
#[derive(Debug)]
pub enum RunTicket {
    /// A scan was served from its cached entry; nothing to execute.
    Cached(Stage),
    Pending(StageRequest),
}

/// What completing a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The originating subject is no longer active; only its cache entry changed.
    AppliedInBackground,
    /// Served from cache without calling out.
    Cached,
    /// Applied in memory, but writing the cache failed.
    Unpersisted(String),
    /// Retryable; previous data is untouched.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "kebab-case")]
pub enum StageStatus {
    Empty,
    Ready,
    Busy,
    Failed(String),
}

/// What the rendering layer needs to draw the current stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageView {
    pub stage: Stage,
    pub subject: Option<String>,
    pub status: StageStatus,
    pub can_advance: bool,
    pub cached_at: Option<i64>,
    pub expires_at: Option<i64>,
}

/// The research pipeline: active subject, displayed stage and the cache
/// behind both.
pub struct Wizard {
    subjects: SubjectController,
    stages: StageController,
    scan_window: Duration,
}

impl Wizard {
    pub fn new(store: CacheStore, subject_window: Duration, scan_window: Duration) -> Self {
        Self {
            subjects: SubjectController::new(store, subject_window),
            stages: StageController::new(),
            scan_window,
        }
    }

    pub fn record(&self) -> &AnalysisRecord {
        self.subjects.record()
    }

    pub fn active_subject(&self) -> Option<&CacheKey> {
        self.subjects.active_key()
    }

    pub fn current_stage(&self) -> Stage {
        self.stages.current()
    }

    pub fn store(&self) -> &CacheStore {
        self.subjects.store()
    }

    pub fn stages(&self) -> &StageController {
        &self.stages
    }

    pub fn market_scan(&self) -> Option<&MarketScanResult> {
        match &self.store().get(&CacheKey::GlobalMarket)?.state {
            CachePayload::MarketScan(scan) => Some(scan),
            _ => None,
        }
    }

    pub fn day_trading(&self) -> Option<&DayTradingResult> {
        self.subjects.day_trading()
    }

    pub fn select_subject(&mut self, raw: &str) -> Result<Selection, WizardError> {
        let selection = self.subjects.select_subject(raw)?;
        let strategy_cached = !self.record().final_strategy.is_empty();
        self.stages.on_subject_selected(strategy_cached);
        Ok(selection)
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.stages.set_stage(stage);
    }

    pub fn advance_stage(&mut self) -> Result<Stage, WizardError> {
        let has_result = self.has_result(self.current_stage());
        self.stages.advance(has_result)
    }

    /// Applies a mutation directly, as the rendering layer's setters do.
    pub async fn update_field(&mut self, update: FieldUpdate) -> Result<(), WizardError> {
        self.subjects.update_field(update).await
    }

    pub fn has_result(&self, stage: Stage) -> bool {
        let record = self.record();
        match stage {
            Stage::MarketScan => self.market_scan().is_some(),
            Stage::DayTradingScan => self.day_trading().is_some(),
            Stage::Financials => !record.financial_analysis.is_empty(),
            Stage::Sentiment => !record.sentiment_analysis.is_empty(),
            Stage::PeerScreen => !record.peer_comparison.is_empty(),
            Stage::LegendPanel => !record.legend_analysis.is_empty(),
            Stage::Strategy => !record.final_strategy.is_empty(),
        }
    }

    /// Starts a run of `stage`.
    ///
    /// Scans whose cached entry is still inside the scan window are served
    /// from it. Otherwise the stage is marked busy and a request is returned
    /// for the caller to execute.
    pub fn begin_run(&mut self, stage: Stage) -> Result<RunTicket, WizardError> {
        if self.stages.is_busy(stage, self.owner(stage).as_ref()) {
            return Err(WizardError::StageBusy(stage));
        }

        if let Some(key) = scan_key(stage) {
            if self.store().is_fresh(&key, self.scan_window) {
                info!(stage = %stage, "scan still fresh, serving cached result");
                return Ok(RunTicket::Cached(stage));
            }
            self.stages.mark_busy(stage, None)?;
            return Ok(RunTicket::Pending(StageRequest {
                stage,
                subject: None,
                context: None,
            }));
        }

        let subject = self.active_subject().cloned().ok_or(WizardError::NoSubject)?;
        let context = (stage == Stage::Strategy).then(|| self.record().clone());
        self.stages.mark_busy(stage, Some(subject.clone()))?;
        Ok(RunTicket::Pending(StageRequest {
            stage,
            subject: Some(subject),
            context,
        }))
    }

    /// Applies a resolved run and clears its busy flag.
    ///
    /// Error state is only set or cleared for runs owned by the active
    /// subject or a global scan; a run for a subject that is no longer
    /// active never touches the stage view of the current one.
    pub async fn complete(&mut self, outcome: StageOutcome) -> Completion {
        let StageOutcome {
            stage,
            subject,
            result,
        } = outcome;

        self.stages.finish(stage, subject.as_ref());
        let foreign = subject.is_some() && subject.as_ref() != self.active_subject();

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                warn!(stage = %stage, error = %e, "stage run failed");
                let message = e.to_string();
                if !foreign {
                    self.stages.set_error(stage, Some(message.clone()));
                }
                return Completion::Failed(message);
            }
        };
        if !foreign {
            self.stages.set_error(stage, None);
        }

        let stored = match (result, subject) {
            (StageResult::MarketScan(scan), _) => self
                .subjects
                .store_mut()
                .put(CacheKey::GlobalMarket, CachePayload::MarketScan(scan))
                .await
                .map(|_| Applied::Active),
            (StageResult::DayTrading(result), _) => self
                .subjects
                .update_field(FieldUpdate::DayTradingResult(result))
                .await
                .map(|_| Applied::Active),
            (result, Some(subject)) => {
                self.subjects
                    .apply_updates(&subject, result.into_updates())
                    .await
            }
            (_, None) => Err(WizardError::NoSubject),
        };

        match stored {
            Ok(Applied::Active) => {
                info!(stage = %stage, "stage result applied");
                Completion::Applied
            }
            Ok(Applied::Background) => Completion::AppliedInBackground,
            Err(e) => {
                warn!(stage = %stage, error = %e, "stage result not persisted");
                Completion::Unpersisted(e.to_string())
            }
        }
    }

    /// Starts, executes and completes a run in one go.
    pub async fn run_stage(
        &mut self,
        stage: Stage,
        research: &dyn ResearchService,
        quotes: &dyn QuoteProvider,
    ) -> Result<Completion, WizardError> {
        match self.begin_run(stage)? {
            RunTicket::Cached(_) => Ok(Completion::Cached),
            RunTicket::Pending(request) => {
                let outcome = request.execute(research, quotes).await;
                Ok(self.complete(outcome).await)
            }
        }
    }

    /// The strategy run owed to the current selection, if the strategy stage
    /// is showing without a result. Handed out at most once per selection.
    pub fn take_auto_run(&mut self) -> Option<StageRequest> {
        let missing = self.record().final_strategy.is_empty();
        let subject = self.active_subject().cloned();
        if !self.stages.take_strategy_trigger(missing, subject.as_ref()) {
            return None;
        }
        match self.begin_run(Stage::Strategy) {
            Ok(RunTicket::Pending(request)) => Some(request),
            _ => None,
        }
    }

    // Who a run of `stage` started now would belong to.
    fn owner(&self, stage: Stage) -> Option<CacheKey> {
        if stage.is_global() {
            None
        } else {
            self.active_subject().cloned()
        }
    }

    pub fn view(&self) -> StageView {
        let stage = self.current_stage();
        let status = if self.stages.is_busy(stage, self.owner(stage).as_ref()) {
            StageStatus::Busy
        } else if let Some(message) = self.stages.error(stage) {
            StageStatus::Failed(message.to_string())
        } else if self.has_result(stage) {
            StageStatus::Ready
        } else {
            StageStatus::Empty
        };

        let key = match stage {
            Stage::MarketScan => Some(CacheKey::GlobalMarket),
            Stage::DayTradingScan => Some(CacheKey::GlobalDayTrading),
            _ => self.active_subject().cloned(),
        };
        let cached_at = key
            .as_ref()
            .and_then(|key| self.store().get(key))
            .map(|entry| entry.timestamp);
        let expires_at = if stage.is_global() {
            cached_at.map(|at| at.saturating_add(window_millis(self.scan_window)))
        } else {
            None
        };

        StageView {
            stage,
            subject: self.active_subject().map(|key| key.as_str().to_string()),
            status,
            can_advance: stage.next().is_some() && self.has_result(stage),
            cached_at,
            expires_at,
        }
    }
}

fn scan_key(stage: Stage) -> Option<CacheKey> {
    match stage {
        Stage::MarketScan => Some(CacheKey::GlobalMarket),
        Stage::DayTradingScan => Some(CacheKey::GlobalDayTrading),
        _ => None,
    }
}
