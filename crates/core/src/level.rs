use crate::{AccountId, ExperienceLedger, LevelRule, NotificationKind, NotificationSink, PersistenceError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    /// Experience gathered inside the current level.
    pub current_xp: u64,
    pub xp_to_next_level: u64,
}

fn next_threshold(threshold: u64, rule: &LevelRule) -> u64 {
    ((threshold as f64 * rule.multiplier).floor() as u64).max(1)
}

pub fn get_level(total_xp: u64, rule: &LevelRule) -> LevelInfo {
    let mut level = 1u32;
    let mut remaining = total_xp;
    let mut threshold = rule.base_xp.max(1);
    while remaining >= threshold {
        remaining -= threshold;
        level = level.saturating_add(1);
        threshold = next_threshold(threshold, rule);
    }
    LevelInfo {
        level,
        current_xp: remaining,
        xp_to_next_level: threshold,
    }
}

/// Total experience at which `level` is first reached.
pub fn total_xp_for(level: u32, rule: &LevelRule) -> u64 {
    let mut total = 0u64;
    let mut threshold = rule.base_xp.max(1);
    for _ in 1..level.max(1) {
        total = total.saturating_add(threshold);
        threshold = next_threshold(threshold, rule);
    }
    total
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpGrant {
    pub amount: u64,
    pub total: u64,
    pub level_up: Option<u32>,
}

/// Account experience for one session. Remembers the last level it saw so
/// that a level-up is announced once, and never for the level found on load.
#[derive(Debug, Clone)]
pub struct ExperienceTracker {
    rule: LevelRule,
    total: u64,
    observed_level: Option<u32>,
}

impl ExperienceTracker {
    pub fn new(rule: LevelRule) -> Self {
        Self {
            rule,
            total: 0,
            observed_level: None,
        }
    }

    pub fn load(
        &mut self,
        ledger: &mut dyn ExperienceLedger,
        account: &AccountId,
    ) -> Result<LevelInfo, PersistenceError> {
        self.total = ledger.experience(account)?;
        let info = get_level(self.total, &self.rule);
        self.observed_level = Some(info.level);
        Ok(info)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn info(&self) -> LevelInfo {
        get_level(self.total, &self.rule)
    }

    pub fn rule(&self) -> &LevelRule {
        &self.rule
    }

    pub fn add(
        &mut self,
        amount: u64,
        ledger: &mut dyn ExperienceLedger,
        notifier: &mut dyn NotificationSink,
        account: &AccountId,
    ) -> Result<XpGrant, PersistenceError> {
        if self.observed_level.is_none() {
            self.total = ledger.experience(account)?;
        }
        let total = self.total.saturating_add(amount);
        ledger.set_experience(account, total)?;
        self.total = total;

        let level = get_level(total, &self.rule).level;
        let level_up = match self.observed_level {
            Some(previous) if level > previous => {
                notifier.notify(
                    NotificationKind::LevelUp,
                    "Level Up!",
                    &format!("You reached level {level}!"),
                );
                log::info!("{account} reached level {level}");
                Some(level)
            }
            _ => None,
        };
        self.observed_level = Some(level);
        Ok(XpGrant {
            amount,
            total,
            level_up,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryExperience, MemoryNotifier};

    #[test]
    fn level_table_follows_growing_thresholds() {
        let rule = LevelRule::default();
        assert_eq!(
            get_level(0, &rule),
            LevelInfo {
                level: 1,
                current_xp: 0,
                xp_to_next_level: 100
            }
        );
        assert_eq!(get_level(99, &rule).level, 1);
        assert_eq!(get_level(100, &rule).level, 2);
        assert_eq!(get_level(100, &rule).xp_to_next_level, 150);
        assert_eq!(get_level(250, &rule).level, 3);
        assert_eq!(get_level(250, &rule).xp_to_next_level, 225);
        // 225 * 1.5 = 337.5, floored.
        assert_eq!(get_level(475, &rule).xp_to_next_level, 337);
    }

    #[test]
    fn level_is_monotonic_and_invertible() {
        let rule = LevelRule::default();
        let mut last = 1;
        for xp in (0..20_000u64).step_by(37) {
            let info = get_level(xp, &rule);
            assert!(info.level >= last);
            assert!(info.current_xp < info.xp_to_next_level);
            assert_eq!(total_xp_for(info.level, &rule) + info.current_xp, xp);
            last = info.level;
        }
    }

    #[test]
    fn no_level_up_notice_on_load() {
        let account = AccountId::new("p");
        let mut ledger = MemoryExperience::with_total(&account, 240);
        let mut notifier = MemoryNotifier::new();
        let mut tracker = ExperienceTracker::new(LevelRule::default());

        assert_eq!(tracker.load(&mut ledger, &account).expect("load").level, 2);
        let grant = tracker
            .add(5, &mut ledger, &mut notifier, &account)
            .expect("add");
        assert_eq!(grant.level_up, None);
        assert!(notifier.sent.is_empty());

        let grant = tracker
            .add(10, &mut ledger, &mut notifier, &account)
            .expect("add");
        assert_eq!(grant.level_up, Some(3));
        assert_eq!(grant.total, 255);
        assert_eq!(notifier.sent[0].detail, "You reached level 3!");
        assert_eq!(ledger.peek(&account), 255);
    }

    #[test]
    fn first_computation_only_records_level() {
        let account = AccountId::new("p");
        let mut ledger = MemoryExperience::new();
        let mut notifier = MemoryNotifier::new();
        let mut tracker = ExperienceTracker::new(LevelRule::default());

        let grant = tracker
            .add(500, &mut ledger, &mut notifier, &account)
            .expect("add");
        assert_eq!(grant.level_up, None);
        assert!(notifier.sent.is_empty());
    }

    #[test]
    fn add_without_load_builds_on_stored_total() {
        let account = AccountId::new("p");
        let mut ledger = MemoryExperience::with_total(&account, 1000);
        let mut notifier = MemoryNotifier::new();
        let mut tracker = ExperienceTracker::new(LevelRule::default());

        let grant = tracker
            .add(5, &mut ledger, &mut notifier, &account)
            .expect("add");
        assert_eq!(grant.total, 1005);
        assert_eq!(grant.level_up, None);
        assert_eq!(ledger.peek(&account), 1005);
        assert_eq!(tracker.total(), 1005);
    }

    #[test]
    fn failed_write_keeps_previous_total() {
        let account = AccountId::new("p");
        let mut ledger = MemoryExperience::new();
        ledger.set_failing(true);
        let mut notifier = MemoryNotifier::new();
        let mut tracker = ExperienceTracker::new(LevelRule::default());
        assert!(tracker
            .add(50, &mut ledger, &mut notifier, &account)
            .is_err());
        assert_eq!(tracker.total(), 0);
    }
}
