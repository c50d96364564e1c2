//! Element resolver with fallback chain orchestration
//!
//! Stages run in a fixed order: primary locator, remembered locator,
//! rewrite heuristics, fuzzy DOM match. Only "not found" advances to the next
//! stage; any other session error is returned as-is.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{ResolveError, SessionError};
use crate::fuzzy::FuzzyMatcher;
use crate::history::LocatorHistory;
use crate::session::BrowserSession;
use crate::strategies::StrategyChain;
use crate::types::{Locator, Resolution, ResolveStage, StageOutcome, StageToggles};

/// Self-healing element resolver
pub struct SelfHealingResolver<S: BrowserSession> {
    session: S,
    history: Arc<dyn LocatorHistory>,
    chain: StrategyChain,
    matcher: FuzzyMatcher,
    stages: StageToggles,
}

/// Locators tried during one `resolve` call
struct Attempts {
    tried: Vec<Locator>,
}

impl Attempts {
    fn new() -> Self {
        Self { tried: Vec::new() }
    }

    fn contains(&self, locator: &Locator) -> bool {
        self.tried.contains(locator)
    }

    fn push(&mut self, locator: Locator) {
        self.tried.push(locator);
    }
}

impl<S: BrowserSession> SelfHealingResolver<S> {
    /// Create a resolver with the default chain and matcher
    pub fn new(session: S, history: Arc<dyn LocatorHistory>) -> Self {
        Self {
            session,
            history,
            chain: StrategyChain::default(),
            matcher: FuzzyMatcher::default(),
            stages: StageToggles::default(),
        }
    }

    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_matcher(mut self, matcher: FuzzyMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_stages(mut self, stages: StageToggles) -> Self {
        self.stages = stages;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn history(&self) -> &Arc<dyn LocatorHistory> {
        &self.history
    }

    pub fn chain(&self) -> &StrategyChain {
        &self.chain
    }

    pub fn matcher(&self) -> &FuzzyMatcher {
        &self.matcher
    }

    pub fn stages(&self) -> StageToggles {
        self.stages
    }

    /// Resolve `element_name`, starting from `primary`.
    pub fn resolve(
        &self,
        element_name: &str,
        primary: &Locator,
    ) -> Result<Resolution<S::Element>, ResolveError> {
        info!(element = element_name, locator = %primary, "Resolving element");
        let mut attempts = Attempts::new();

        if let StageOutcome::Found(element, locator) = self.try_primary(primary, &mut attempts)? {
            return Ok(self.succeed(element_name, element, locator, ResolveStage::Primary, None));
        }
        warn!(
            element = element_name,
            locator = %primary,
            "Locator not found, attempting to heal"
        );

        if self.stages.history {
            if let StageOutcome::Found(element, locator) =
                self.try_history(element_name, &mut attempts)?
            {
                return Ok(self.succeed(element_name, element, locator, ResolveStage::History, None));
            }
        }

        if self.stages.heuristics {
            if let StageOutcome::Found(element, locator) =
                self.try_heuristics(primary, &mut attempts)?
            {
                return Ok(self.succeed(
                    element_name,
                    element,
                    locator,
                    ResolveStage::Heuristic,
                    None,
                ));
            }
        }

        if self.stages.fuzzy {
            if let (StageOutcome::Found(element, locator), score) =
                self.try_fuzzy(primary, &mut attempts)?
            {
                return Ok(self.succeed(element_name, element, locator, ResolveStage::Fuzzy, score));
            }
        }

        warn!(
            element = element_name,
            attempts = attempts.tried.len(),
            "All healing stages exhausted"
        );
        Err(ResolveError::ElementNotFound {
            element: element_name.to_string(),
            attempted: attempts.tried,
        })
    }

    /// Look up `locator` once; `NotFound` becomes a stage outcome, every other
    /// error propagates.
    fn attempt(
        &self,
        locator: &Locator,
        attempts: &mut Attempts,
    ) -> Result<StageOutcome<S::Element>, SessionError> {
        attempts.push(locator.clone());
        match self.session.find(locator) {
            Ok(element) => Ok(StageOutcome::Found(element, locator.clone())),
            Err(err) if err.is_not_found() => {
                debug!(locator = %locator, "not found");
                Ok(StageOutcome::NotFound)
            }
            Err(err) => {
                warn!(locator = %locator, error = %err, "session failure during lookup");
                Err(err)
            }
        }
    }

    fn try_primary(
        &self,
        primary: &Locator,
        attempts: &mut Attempts,
    ) -> Result<StageOutcome<S::Element>, SessionError> {
        debug!(stage = "primary", locator = %primary, "trying stage");
        self.attempt(primary, attempts)
    }

    fn try_history(
        &self,
        element_name: &str,
        attempts: &mut Attempts,
    ) -> Result<StageOutcome<S::Element>, SessionError> {
        let Some(remembered) = self.history.lookup(element_name) else {
            debug!(stage = "history", element = element_name, "no history entry");
            return Ok(StageOutcome::Skipped);
        };
        if attempts.contains(&remembered) {
            debug!(stage = "history", locator = %remembered, "history entry already tried");
            return Ok(StageOutcome::Skipped);
        }
        debug!(stage = "history", locator = %remembered, "trying stage");
        self.attempt(&remembered, attempts)
    }

    fn try_heuristics(
        &self,
        primary: &Locator,
        attempts: &mut Attempts,
    ) -> Result<StageOutcome<S::Element>, SessionError> {
        let mut outcome = StageOutcome::Skipped;
        for (heuristic, rewritten) in self.chain.candidates(primary) {
            if attempts.contains(&rewritten) {
                continue;
            }
            debug!(stage = "heuristic", heuristic, locator = %rewritten, "trying stage");
            outcome = self.attempt(&rewritten, attempts)?;
            if outcome.is_found() {
                break;
            }
        }
        Ok(outcome)
    }

    fn try_fuzzy(
        &self,
        primary: &Locator,
        attempts: &mut Attempts,
    ) -> Result<(StageOutcome<S::Element>, Option<u8>), SessionError> {
        let snapshot = self.session.current_document()?;
        let Some(candidate) = self.matcher.best_match(&snapshot, primary.query()) else {
            warn!(stage = "fuzzy", "No matching element found");
            return Ok((StageOutcome::Skipped, None));
        };
        let healed = candidate.healed_locator();
        info!(
            stage = "fuzzy",
            score = candidate.score,
            tag = %candidate.tag,
            "Healed locator candidate found"
        );
        if attempts.contains(&healed) {
            debug!(stage = "fuzzy", locator = %healed, "fuzzy locator already tried");
            return Ok((StageOutcome::Skipped, None));
        }
        let outcome = self.attempt(&healed, attempts)?;
        if !outcome.is_found() {
            warn!(stage = "fuzzy", locator = %healed, "Healing failed, element still not found");
        }
        Ok((outcome, Some(candidate.score)))
    }

    fn succeed(
        &self,
        element_name: &str,
        element: S::Element,
        locator: Locator,
        stage: ResolveStage,
        score: Option<u8>,
    ) -> Resolution<S::Element> {
        let changed = self.history.record(element_name, locator.clone());
        if stage.is_healed() {
            info!(
                element = element_name,
                stage = stage.name(),
                locator = %locator,
                history_updated = changed,
                "Element healed"
            );
        } else {
            debug!(element = element_name, history_updated = changed, "primary locator resolved");
        }
        let resolution = Resolution::new(element, locator, stage);
        match score {
            Some(score) => resolution.with_score(score),
            None => resolution,
        }
    }
}
