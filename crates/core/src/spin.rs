use crate::{
    CaseDefinition, CaseOpened, Completion, ConfigError, Event, EventBus, LedgerError,
    PersistenceError, ProgressionTracker, ResolvedOutcome, RevealTimer, RewardEngine, RngState,
    RandomSource, Services, SpinConfig, XpRule,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod strip;

pub use strip::*;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpinError {
    #[error("a case open is already in progress")]
    Busy,
    #[error("case catalog not loaded")]
    CatalogNotLoaded,
    #[error("invalid phase: {0:?}")]
    InvalidPhase(SpinPhase),
    #[error("not enough money: balance {balance:.2}, price {price:.2}")]
    InsufficientFunds { balance: f64, price: f64 },
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinPhase {
    Idle,
    FundsPending,
    Rolling,
    Settling,
}

/// Sound played when the strip lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinCue {
    Land,
    Rare,
}

impl SpinCue {
    pub fn for_outcome(outcome: &ResolvedOutcome) -> Self {
        if outcome.is_highlight() {
            SpinCue::Rare
        } else {
            SpinCue::Land
        }
    }
}

/// A paid request between withdrawal and settle. The outcome is fixed
/// before the strip starts moving.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinSession {
    pub case_id: String,
    pub case_price: f64,
    pub strip: Vec<StripTile>,
    pub winner_index: usize,
    pub outcome: ResolvedOutcome,
    /// Terminal offset in slot widths.
    pub stop_offset: f64,
    pub skipped: bool,
    pub started_at_ms: u64,
}

impl SpinSession {
    pub fn stop_position(&self, slot_width: f64, viewport_width: f64) -> f64 {
        stop_position(self.winner_index, self.stop_offset, slot_width, viewport_width)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettleFailure {
    #[error("inventory: {0}")]
    Inventory(PersistenceError),
    #[error("experience: {0}")]
    Experience(PersistenceError),
    #[error("progress: {0}")]
    Progress(PersistenceError),
}

/// What a settle committed, and which side effects did not go through.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub case_id: String,
    pub outcome: ResolvedOutcome,
    pub cue: SpinCue,
    pub stat_trak_cue: bool,
    pub skipped: bool,
    pub xp_gained: u64,
    pub level_up: Option<u32>,
    pub completions: Vec<Completion>,
    pub failures: Vec<SettleFailure>,
}

impl Settlement {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.completions.iter().all(|c| c.failures.is_empty())
    }
}

struct Prepared {
    outcome: ResolvedOutcome,
    strip: Vec<StripTile>,
    stop_offset: f64,
}

/// Drives one case page: open, roll, optional skip, settle.
#[derive(Debug)]
pub struct SpinMachine<R: RandomSource = RngState> {
    config: SpinConfig,
    xp_rule: XpRule,
    engine: RewardEngine,
    rng: R,
    catalog: Option<CaseDefinition>,
    phase: SpinPhase,
    session: Option<SpinSession>,
    timer: RevealTimer,
}

impl<R: RandomSource> SpinMachine<R> {
    pub fn new(engine: RewardEngine, config: SpinConfig, rng: R) -> Self {
        Self {
            config,
            xp_rule: XpRule::default(),
            engine,
            rng,
            catalog: None,
            phase: SpinPhase::Idle,
            session: None,
            timer: RevealTimer::new(),
        }
    }

    pub fn with_xp_rule(mut self, rule: XpRule) -> Self {
        self.xp_rule = rule;
        self
    }

    pub fn set_catalog(&mut self, case: CaseDefinition) {
        log::debug!("catalog loaded for {}", case.id);
        self.catalog = Some(case);
    }

    pub fn load_catalog(
        &mut self,
        store: &mut dyn crate::CatalogStore,
        case_id: &str,
    ) -> Result<(), PersistenceError> {
        let case = store.load_catalog(case_id)?;
        self.set_catalog(case);
        Ok(())
    }

    pub fn catalog(&self) -> Option<&CaseDefinition> {
        self.catalog.as_ref()
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    /// Set from the moment a request begins until it ends, whichever way.
    pub fn is_locked(&self) -> bool {
        self.phase != SpinPhase::Idle
    }

    pub fn session(&self) -> Option<&SpinSession> {
        self.session.as_ref()
    }

    pub fn timer(&self) -> &RevealTimer {
        &self.timer
    }

    pub fn config(&self) -> &SpinConfig {
        &self.config
    }

    pub fn begin_open(&mut self, events: &mut EventBus) -> Result<(), SpinError> {
        if self.phase != SpinPhase::Idle {
            return Err(SpinError::Busy);
        }
        let Some(case) = self.catalog.as_ref() else {
            return Err(SpinError::CatalogNotLoaded);
        };
        events.push(Event::OpenRequested {
            case_id: case.id.clone(),
        });
        self.phase = SpinPhase::FundsPending;
        Ok(())
    }

    /// Checks the balance, withdraws the price and starts the roll. Any
    /// failure returns the machine to idle with no money moved.
    pub fn fund(
        &mut self,
        now_ms: u64,
        services: &mut Services<'_>,
        events: &mut EventBus,
    ) -> Result<(), SpinError> {
        if self.phase != SpinPhase::FundsPending {
            return Err(SpinError::InvalidPhase(self.phase));
        }
        match self.try_fund(now_ms, services, events) {
            Ok(()) => Ok(()),
            Err(err) => {
                let case_id = self
                    .catalog
                    .as_ref()
                    .map(|case| case.id.clone())
                    .unwrap_or_default();
                log::debug!("open of {case_id} rejected: {err}");
                events.push(Event::OpenRejected {
                    case_id,
                    reason: err.to_string(),
                });
                self.reset();
                Err(err)
            }
        }
    }

    pub fn open(
        &mut self,
        now_ms: u64,
        services: &mut Services<'_>,
        events: &mut EventBus,
    ) -> Result<(), SpinError> {
        self.begin_open(events)?;
        self.fund(now_ms, services, events)
    }

    /// Drops a request that has not been funded yet.
    pub fn cancel(&mut self) -> Result<(), SpinError> {
        if self.phase != SpinPhase::FundsPending {
            return Err(SpinError::InvalidPhase(self.phase));
        }
        self.reset();
        Ok(())
    }

    /// Shortens the remaining reveal. Only the timer changes; the outcome
    /// stays the one drawn at roll start.
    pub fn skip(&mut self, now_ms: u64, events: &mut EventBus) -> Result<(), SpinError> {
        if self.phase != SpinPhase::Rolling {
            return Err(SpinError::InvalidPhase(self.phase));
        }
        let Some(session) = self.session.as_mut() else {
            return Err(SpinError::InvalidPhase(self.phase));
        };
        let remaining_ms = self.timer.remaining(now_ms).unwrap_or(0);
        session.skipped = true;
        self.timer.arm(now_ms, self.config.skip_reveal_ms());
        self.phase = SpinPhase::Settling;
        events.push(Event::RollSkipped { remaining_ms });
        log::debug!("roll of {} skipped with {remaining_ms}ms left", session.case_id);
        Ok(())
    }

    /// Tick cues due between two clock readings of a running reveal.
    pub fn ticks_between(&self, from_ms: u64, to_ms: u64) -> u64 {
        match (&self.session, self.phase) {
            (Some(session), SpinPhase::Rolling | SpinPhase::Settling) => ticks_between(
                session.started_at_ms,
                self.config.tick_interval_ms,
                from_ms,
                to_ms,
            ),
            _ => 0,
        }
    }

    /// Settles once the reveal timer has fired.
    pub fn poll(
        &mut self,
        now_ms: u64,
        services: &mut Services<'_>,
        tracker: &mut ProgressionTracker,
        events: &mut EventBus,
    ) -> Option<Settlement> {
        if !self.timer.fired(now_ms) {
            return None;
        }
        self.settle(services, tracker, events)
    }

    /// Commits the session. Runs at most once per paid request; later
    /// calls return `None`.
    pub fn settle(
        &mut self,
        services: &mut Services<'_>,
        tracker: &mut ProgressionTracker,
        events: &mut EventBus,
    ) -> Option<Settlement> {
        if !matches!(self.phase, SpinPhase::Rolling | SpinPhase::Settling) {
            log::debug!("settle ignored in phase {:?}", self.phase);
            return None;
        }
        let session = self.session.take()?;
        self.reset();

        let outcome = session.outcome;
        let cue = SpinCue::for_outcome(&outcome);
        let mut failures = Vec::new();

        if let Err(err) = services.inventory.append_item(services.account, &outcome) {
            log::warn!("could not store {} for {}: {err}", outcome.item.name, services.account);
            failures.push(SettleFailure::Inventory(err));
        }

        let xp_gained = self.xp_rule.xp_for(session.case_price, &outcome.rarity);
        let mut level_up = None;
        match tracker.experience_mut().add(
            xp_gained,
            &mut *services.experience,
            &mut *services.notifier,
            services.account,
        ) {
            Ok(grant) => {
                events.push(Event::ExperienceGained {
                    amount: grant.amount,
                    total: grant.total,
                });
                level_up = grant.level_up;
            }
            Err(err) => {
                log::warn!("xp for {} was not granted: {err}", session.case_id);
                failures.push(SettleFailure::Experience(err));
            }
        }
        if let Some(level) = level_up {
            events.push(Event::LevelUp { level });
        }

        let opened = CaseOpened {
            case_id: session.case_id.clone(),
            case_price: session.case_price,
            item_rarity: outcome.rarity.clone(),
            item_value: outcome.final_price,
            is_special: outcome.item.is_special(),
        };
        let update = tracker.handle_case_opened(&opened, services);
        failures.extend(update.failures.into_iter().map(SettleFailure::Progress));
        for completion in &update.completions {
            events.push(Event::GoalCompleted {
                id: completion.id.clone(),
                category: completion.category,
            });
            if let Some(level) = completion.level_up {
                events.push(Event::LevelUp { level });
                level_up = Some(level_up.map_or(level, |prev: u32| prev.max(level)));
            }
        }

        events.push(Event::Settled {
            case_id: session.case_id.clone(),
            item: outcome.item.name.clone(),
            rarity: outcome.rarity.clone(),
            wear: outcome.wear_code,
            price: outcome.final_price,
            cue,
        });
        log::info!(
            "{} opened {} -> {} ({}, ${:.2})",
            services.account,
            session.case_id,
            outcome.item.name,
            outcome.rarity,
            outcome.final_price
        );

        Some(Settlement {
            case_id: session.case_id,
            stat_trak_cue: outcome.stat_trak,
            outcome,
            cue,
            skipped: session.skipped,
            xp_gained,
            level_up,
            completions: update.completions,
            failures,
        })
    }

    fn reset(&mut self) {
        self.phase = SpinPhase::Idle;
        self.timer.cancel();
    }

    fn try_fund(
        &mut self,
        now_ms: u64,
        services: &mut Services<'_>,
        events: &mut EventBus,
    ) -> Result<(), SpinError> {
        let case = self.catalog.as_ref().ok_or(SpinError::CatalogNotLoaded)?;
        case.validate()?;
        let prepared = prepare(&self.engine, &self.config, case, &mut self.rng)?;

        let price = case.price;
        let balance = services.ledger.balance(services.account)?;
        if balance < price {
            return Err(SpinError::InsufficientFunds { balance, price });
        }
        let balance = services.ledger.withdraw(services.account, price)?;
        events.push(Event::FundsWithdrawn {
            case_id: case.id.clone(),
            price,
            balance,
        });

        let session = SpinSession {
            case_id: case.id.clone(),
            case_price: price,
            strip: prepared.strip,
            winner_index: self.config.winner_slot(),
            outcome: prepared.outcome,
            stop_offset: prepared.stop_offset,
            skipped: false,
            started_at_ms: now_ms,
        };
        let duration_ms = self.config.full_reveal_ms();
        events.push(Event::RollStarted {
            case_id: session.case_id.clone(),
            strip_length: session.strip.len(),
            winner_index: session.winner_index,
            duration_ms,
        });
        log::debug!("roll of {} started at {now_ms}", session.case_id);
        self.timer.arm(now_ms, duration_ms);
        self.session = Some(session);
        self.phase = SpinPhase::Rolling;
        Ok(())
    }
}

fn prepare<R: RandomSource + ?Sized>(
    engine: &RewardEngine,
    config: &SpinConfig,
    case: &CaseDefinition,
    rng: &mut R,
) -> Result<Prepared, ConfigError> {
    let outcome = engine.resolve(case, rng)?;
    let strip = build_strip(case, &outcome, config, rng)?;
    let stop_offset = draw_offset(config, rng);
    Ok(Prepared {
        outcome,
        strip,
        stop_offset,
    })
}
