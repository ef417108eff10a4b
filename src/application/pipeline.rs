use crate::domain::cache::CacheKey;
use crate::domain::error::WizardError;
use crate::domain::stage::Stage;
use std::collections::{HashMap, HashSet};

/// Navigation state of the pipeline: displayed stage, busy flags per stage
/// and owning subject, error flags for the active subject, and the pending
/// strategy auto-run.
///
/// Global scans are owned by `None`.
#[derive(Debug)]
pub struct StageController {
    current: Stage,
    busy: HashSet<(Stage, Option<CacheKey>)>,
    errors: HashMap<Stage, String>,
    strategy_armed: bool,
}

impl Default for StageController {
    fn default() -> Self {
        Self::new()
    }
}

impl StageController {
    pub fn new() -> Self {
        Self {
            current: Stage::MarketScan,
            busy: HashSet::new(),
            errors: HashMap::new(),
            strategy_armed: false,
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Jumps to any stage. Entering a stage never starts a run by itself.
    pub fn set_stage(&mut self, stage: Stage) {
        self.current = stage;
    }

    /// Moves to the next subject-scoped stage once the current one has a result.
    pub fn advance(&mut self, has_result: bool) -> Result<Stage, WizardError> {
        let next = self
            .current
            .next()
            .ok_or(WizardError::CannotAdvance(self.current))?;
        if !has_result {
            return Err(WizardError::CannotAdvance(self.current));
        }
        self.current = next;
        Ok(next)
    }

    pub fn is_busy(&self, stage: Stage, owner: Option<&CacheKey>) -> bool {
        self.busy.contains(&(stage, owner.cloned()))
    }

    pub fn error(&self, stage: Stage) -> Option<&str> {
        self.errors.get(&stage).map(String::as_str)
    }

    /// Marks a run for the active subject as pending and clears the stage's
    /// error. A stage runs at most once at a time per owner.
    pub fn mark_busy(&mut self, stage: Stage, owner: Option<CacheKey>) -> Result<(), WizardError> {
        if !self.busy.insert((stage, owner)) {
            return Err(WizardError::StageBusy(stage));
        }
        self.errors.remove(&stage);
        Ok(())
    }

    /// Clears the busy flag of a run, leaving error state alone.
    pub fn finish(&mut self, stage: Stage, owner: Option<&CacheKey>) {
        self.busy.remove(&(stage, owner.cloned()));
    }

    /// Sets or clears the stage's retryable error.
    pub fn set_error(&mut self, stage: Stage, error: Option<String>) {
        match error {
            Some(message) => {
                self.errors.insert(stage, message);
            }
            None => {
                self.errors.remove(&stage);
            }
        }
    }

    /// Lands on the first subject stage and re-arms the strategy auto-run
    /// unless the subject already has a strategy.
    pub fn on_subject_selected(&mut self, strategy_cached: bool) {
        self.current = Stage::FIRST_SUBJECT_STAGE;
        self.errors.retain(|stage, _| stage.is_global());
        self.strategy_armed = !strategy_cached;
    }

    /// True once per selection, when the strategy stage is showing with no
    /// strategy and no run in flight for `subject`.
    pub fn take_strategy_trigger(
        &mut self,
        strategy_missing: bool,
        subject: Option<&CacheKey>,
    ) -> bool {
        if self.current != Stage::Strategy || !self.strategy_armed {
            return false;
        }
        if !strategy_missing || self.is_busy(Stage::Strategy, subject) {
            return false;
        }
        self.strategy_armed = false;
        true
    }
}
