use crate::{format_money, CaseDefinition, ResolvedOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    Quest,
    Achievement,
}

/// What a goal listens for. Targets of the spend goal are whole dollars and
/// its progress is kept in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalKind {
    FirstCase,
    SpendOnCases,
    OpenAllCaseTypes { case_ids: Vec<String> },
    SpecialItemFromCase { case_id: String },
    FirstRarity { rarity: String },
    CaseOpenCount { case_id: String },
    ItemValueAtLeast { value: f64 },
    RarityStreak { rarity: String, length: usize },
    BulkSell,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalReward {
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub money: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: GoalCategory,
    pub kind: GoalKind,
    #[serde(default = "default_target")]
    pub target: u64,
    #[serde(default)]
    pub reward: GoalReward,
}

fn default_target() -> u64 {
    1
}

impl GoalDefinition {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: GoalCategory,
        kind: GoalKind,
        target: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category,
            kind,
            target,
            reward: GoalReward::default(),
        }
    }

    pub fn with_reward(mut self, xp: u64, money: f64) -> Self {
        self.reward = GoalReward { xp, money };
        self
    }

    /// Target in the unit progress is stored in.
    pub fn progress_target(&self) -> u64 {
        match self.kind {
            GoalKind::SpendOnCases => self.target.saturating_mul(100),
            _ => self.target,
        }
    }

    pub fn fraction(&self, state: &GoalState) -> f64 {
        let target = self.progress_target();
        if target == 0 {
            return 1.0;
        }
        (state.progress as f64 / target as f64).min(1.0)
    }

    /// `"$200.00 / $500.00"` for the spend goal, `"3 / 19"` otherwise.
    pub fn progress_label(&self, state: &GoalState) -> String {
        match self.kind {
            GoalKind::SpendOnCases => format!(
                "{} / {}",
                format_money(state.progress as f64 / 100.0),
                format_money(self.target as f64)
            ),
            _ => format!("{} / {}", state.progress, self.target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalState {
    pub id: String,
    #[serde(default)]
    pub progress: u64,
    #[serde(default)]
    pub completed: bool,
}

impl GoalState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            progress: 0,
            completed: false,
        }
    }
}

/// Everything the tracker needs to know about one committed open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOpened {
    pub case_id: String,
    pub case_price: f64,
    pub item_rarity: String,
    pub item_value: f64,
    pub is_special: bool,
}

impl CaseOpened {
    pub fn new(case_id: impl Into<String>, case_price: f64, item_rarity: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            case_price,
            item_rarity: item_rarity.into(),
            item_value: 0.0,
            is_special: false,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.item_value = value;
        self
    }

    pub fn special(mut self) -> Self {
        self.is_special = true;
        self
    }

    pub fn from_outcome(case: &CaseDefinition, outcome: &ResolvedOutcome) -> Self {
        Self {
            case_id: case.id.clone(),
            case_price: case.price,
            item_rarity: outcome.rarity.clone(),
            item_value: outcome.final_price,
            is_special: outcome.item.is_special(),
        }
    }
}
