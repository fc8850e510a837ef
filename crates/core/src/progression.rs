use crate::{
    ExperienceTracker, LedgerError, LevelInfo, LevelRule, NotificationKind, PersistenceError,
    Services,
};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

mod goals;

pub use goals::*;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProgressionError {
    #[error("goal {0} is defined twice")]
    DuplicateGoal(String),
    #[error("goal {0} has a zero target")]
    ZeroTarget(String),
    #[error("goal {0} has an empty streak window")]
    EmptyStreak(String),
    #[error("progression store error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// A reward step that did not go through. The completion itself stands.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GrantFailure {
    #[error("saving {goal} failed: {source}")]
    Save {
        goal: String,
        source: PersistenceError,
    },
    #[error("granting {amount} xp failed: {source}")]
    Experience {
        amount: u64,
        source: PersistenceError,
    },
    #[error("granting {amount:.2} money failed: {source}")]
    Money { amount: f64, source: LedgerError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub id: String,
    pub title: String,
    pub category: GoalCategory,
    pub xp: u64,
    pub money: f64,
    pub level_up: Option<u32>,
    pub failures: Vec<GrantFailure>,
}

/// Result of feeding one event to the tracker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    pub completions: Vec<Completion>,
    /// Progress writes that failed outside of a completion.
    pub failures: Vec<PersistenceError>,
}

impl ProgressUpdate {
    pub fn level_up(&self) -> Option<u32> {
        self.completions.iter().filter_map(|c| c.level_up).max()
    }
}

/// Quest and achievement progress for one account session.
#[derive(Debug, Clone)]
pub struct ProgressionTracker {
    definitions: Vec<GoalDefinition>,
    states: Vec<GoalState>,
    seen_cases: Vec<String>,
    /// Union of every open-all allow-list; other case ids are never recorded.
    tracked_cases: Vec<String>,
    recent_rarities: VecDeque<String>,
    window: usize,
    experience: ExperienceTracker,
}

impl ProgressionTracker {
    /// Loads stored rows for every definition. Definitions without a row get
    /// a fresh zero row, saved right away. Quests are evaluated before
    /// achievements, each group in the order given.
    pub fn load(
        mut definitions: Vec<GoalDefinition>,
        level_rule: LevelRule,
        services: &mut Services<'_>,
    ) -> Result<Self, ProgressionError> {
        validate(&definitions)?;
        definitions.sort_by_key(|def| def.category);

        let snapshot = services.progress.load_progress(services.account)?;
        let mut states = Vec::with_capacity(definitions.len());
        for def in &definitions {
            match snapshot.goals.iter().find(|row| row.id == def.id) {
                Some(row) => states.push(row.clone()),
                None => {
                    let row = GoalState::new(def.id.clone());
                    services.progress.save_progress(services.account, &row)?;
                    log::debug!("created progress row {} for {}", def.id, services.account);
                    states.push(row);
                }
            }
        }

        let mut tracked_cases: Vec<String> = Vec::new();
        for def in &definitions {
            if let GoalKind::OpenAllCaseTypes { case_ids } = &def.kind {
                for id in case_ids {
                    if !tracked_cases.contains(id) {
                        tracked_cases.push(id.clone());
                    }
                }
            }
        }

        let mut seen_cases = Vec::new();
        for id in snapshot.seen_cases {
            if !tracked_cases.contains(&id) {
                log::debug!("dropping untracked case {id} from the opened list");
                continue;
            }
            if !seen_cases.contains(&id) {
                seen_cases.push(id);
            }
        }

        let window = definitions
            .iter()
            .filter_map(|def| match def.kind {
                GoalKind::RarityStreak { length, .. } => Some(length),
                _ => None,
            })
            .max()
            .unwrap_or(1);

        let mut experience = ExperienceTracker::new(level_rule);
        experience.load(&mut *services.experience, services.account)?;

        Ok(Self {
            definitions,
            states,
            seen_cases,
            tracked_cases,
            recent_rarities: VecDeque::with_capacity(window),
            window,
            experience,
        })
    }

    pub fn definitions(&self) -> &[GoalDefinition] {
        &self.definitions
    }

    pub fn state(&self, id: &str) -> Option<&GoalState> {
        self.states.iter().find(|state| state.id == id)
    }

    pub fn goals(&self) -> impl Iterator<Item = (&GoalDefinition, &GoalState)> {
        self.definitions.iter().zip(self.states.iter())
    }

    pub fn seen_cases(&self) -> &[String] {
        &self.seen_cases
    }

    pub fn level(&self) -> LevelInfo {
        self.experience.info()
    }

    pub fn experience(&self) -> &ExperienceTracker {
        &self.experience
    }

    pub fn experience_mut(&mut self) -> &mut ExperienceTracker {
        &mut self.experience
    }

    pub fn handle_case_opened(
        &mut self,
        event: &CaseOpened,
        services: &mut Services<'_>,
    ) -> ProgressUpdate {
        let mut update = ProgressUpdate::default();

        self.recent_rarities.push_back(event.item_rarity.clone());
        while self.recent_rarities.len() > self.window {
            self.recent_rarities.pop_front();
        }

        if self.tracked_cases.contains(&event.case_id) && !self.seen_cases.contains(&event.case_id) {
            self.seen_cases.push(event.case_id.clone());
            if let Err(err) = services
                .progress
                .save_seen_cases(services.account, &self.seen_cases)
            {
                log::warn!("could not save opened case list: {err}");
                update.failures.push(err);
            }
        }

        for (def, state) in self.definitions.iter().zip(self.states.iter_mut()) {
            if state.completed {
                continue;
            }
            let Some(progress) =
                case_progress(def, state, event, &self.seen_cases, &self.recent_rarities)
            else {
                continue;
            };
            advance(def, state, progress, &mut self.experience, services, &mut update);
        }
        update
    }

    /// Bulk sell goals keep the largest single sale seen.
    pub fn handle_items_sold(&mut self, count: u32, services: &mut Services<'_>) -> ProgressUpdate {
        let mut update = ProgressUpdate::default();
        for (def, state) in self.definitions.iter().zip(self.states.iter_mut()) {
            if state.completed || def.kind != GoalKind::BulkSell {
                continue;
            }
            let progress = state.progress.max(u64::from(count));
            advance(def, state, progress, &mut self.experience, services, &mut update);
        }
        update
    }
}

fn validate(definitions: &[GoalDefinition]) -> Result<(), ProgressionError> {
    let mut ids = HashSet::new();
    for def in definitions {
        if !ids.insert(def.id.as_str()) {
            return Err(ProgressionError::DuplicateGoal(def.id.clone()));
        }
        if def.target == 0 {
            return Err(ProgressionError::ZeroTarget(def.id.clone()));
        }
        if matches!(def.kind, GoalKind::RarityStreak { length: 0, .. }) {
            return Err(ProgressionError::EmptyStreak(def.id.clone()));
        }
    }
    Ok(())
}

/// New progress for an open, or `None` when the goal does not react.
fn case_progress(
    def: &GoalDefinition,
    state: &GoalState,
    event: &CaseOpened,
    seen_cases: &[String],
    recent: &VecDeque<String>,
) -> Option<u64> {
    match &def.kind {
        GoalKind::FirstCase => Some(1),
        GoalKind::SpendOnCases => {
            if event.case_price <= 0.0 {
                return None;
            }
            let cents = (event.case_price * 100.0).round() as u64;
            Some(state.progress.saturating_add(cents))
        }
        GoalKind::OpenAllCaseTypes { case_ids } => {
            if event.case_id.is_empty() {
                return None;
            }
            let count = seen_cases.iter().filter(|id| case_ids.contains(id)).count();
            Some(count as u64)
        }
        GoalKind::SpecialItemFromCase { case_id } => {
            (event.case_id == *case_id && event.is_special).then_some(1)
        }
        GoalKind::FirstRarity { rarity } => (event.item_rarity == *rarity).then_some(1),
        GoalKind::CaseOpenCount { case_id } => {
            (event.case_id == *case_id).then(|| state.progress.saturating_add(1))
        }
        GoalKind::ItemValueAtLeast { value } => (event.item_value >= *value).then_some(1),
        GoalKind::RarityStreak { rarity, length } => {
            let streak = recent.len() >= *length
                && recent.iter().rev().take(*length).all(|r| r == rarity);
            streak.then_some(1)
        }
        GoalKind::BulkSell => None,
    }
}

fn advance(
    def: &GoalDefinition,
    state: &mut GoalState,
    progress: u64,
    experience: &mut ExperienceTracker,
    services: &mut Services<'_>,
    update: &mut ProgressUpdate,
) {
    let target = def.progress_target();
    if progress >= target {
        if let Some(completion) = complete_goal(def, state, experience, services) {
            update.completions.push(completion);
        }
        return;
    }
    if progress == state.progress {
        return;
    }
    state.progress = progress;
    if let Err(err) = services.progress.save_progress(services.account, state) {
        log::warn!("could not save progress of {}: {err}", def.id);
        update.failures.push(err);
    }
}

/// Marks a goal complete and pays its reward. A goal that is already
/// complete yields nothing, so rewards go out at most once.
pub fn complete_goal(
    def: &GoalDefinition,
    state: &mut GoalState,
    experience: &mut ExperienceTracker,
    services: &mut Services<'_>,
) -> Option<Completion> {
    if state.completed {
        return None;
    }
    state.completed = true;
    state.progress = def.progress_target();

    let mut failures = Vec::new();
    if let Err(source) = services.progress.save_progress(services.account, state) {
        log::warn!("completion of {} was not saved: {source}", def.id);
        failures.push(GrantFailure::Save {
            goal: def.id.clone(),
            source,
        });
    }

    let mut level_up = None;
    if def.reward.xp > 0 {
        match experience.add(
            def.reward.xp,
            &mut *services.experience,
            &mut *services.notifier,
            services.account,
        ) {
            Ok(grant) => level_up = grant.level_up,
            Err(source) => {
                log::warn!("xp reward of {} failed: {source}", def.id);
                failures.push(GrantFailure::Experience {
                    amount: def.reward.xp,
                    source,
                });
            }
        }
    }

    let money = match def.category {
        GoalCategory::Quest => def.reward.money,
        GoalCategory::Achievement => 0.0,
    };
    if money > 0.0 {
        if let Err(source) = services.ledger.credit(services.account, money) {
            log::warn!("money reward of {} failed: {source}", def.id);
            failures.push(GrantFailure::Money {
                amount: money,
                source,
            });
        }
    }

    let (kind, title) = match def.category {
        GoalCategory::Quest => (NotificationKind::Quest, "Quest Complete!"),
        GoalCategory::Achievement => (NotificationKind::Achievement, "Achievement Unlocked!"),
    };
    services.notifier.notify(kind, title, &def.title);
    log::info!("{} completed {:?} {}", services.account, def.category, def.id);

    Some(Completion {
        id: def.id.clone(),
        title: def.title.clone(),
        category: def.category,
        xp: def.reward.xp,
        money,
        level_up,
        failures,
    })
}
