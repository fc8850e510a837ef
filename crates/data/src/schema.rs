use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use unboxer_core::{
    builtin_powerups, CaseDefinition, EconomyRule, GoalCategory, GoalDefinition, GoalKind,
    GoalReward, LevelRule, PatternRule, PowerupDef, SpinConfig, XpRule,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub cases: Vec<CaseDefinition>,
}

/// A goal as written in `progression.json`; the list it sits in decides
/// its category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: GoalKind,
    #[serde(default = "default_target")]
    pub target: u64,
    #[serde(default)]
    pub reward: GoalReward,
}

fn default_target() -> u64 {
    1
}

impl GoalEntry {
    pub fn into_definition(self, category: GoalCategory) -> GoalDefinition {
        GoalDefinition {
            id: self.id,
            title: self.title,
            description: self.description,
            category,
            kind: self.kind,
            target: self.target,
            reward: self.reward,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressionFile {
    #[serde(default)]
    pub quests: Vec<GoalEntry>,
    #[serde(default)]
    pub achievements: Vec<GoalEntry>,
}

impl ProgressionFile {
    /// Quests first, then achievements, each in file order.
    pub fn into_definitions(self) -> Vec<GoalDefinition> {
        self.quests
            .into_iter()
            .map(|entry| entry.into_definition(GoalCategory::Quest))
            .chain(
                self.achievements
                    .into_iter()
                    .map(|entry| entry.into_definition(GoalCategory::Achievement)),
            )
            .collect()
    }
}

/// Tunables read from the optional `settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub spin: SpinConfig,
    pub economy: EconomyRule,
    pub level: LevelRule,
    pub xp: XpRule,
    pub powerups: Vec<PowerupDef>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spin: SpinConfig::default(),
            economy: EconomyRule::default(),
            level: LevelRule::default(),
            xp: XpRule::default(),
            powerups: builtin_powerups(),
        }
    }
}

/// Pattern table entries in file order, duplicates kept so that the
/// loader can decide what to do with them.
#[derive(Debug, Clone, Default)]
pub struct PatternFile {
    pub entries: Vec<(String, Vec<PatternRule>)>,
}

impl PatternFile {
    pub fn duplicates(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .filter(|(item, _)| !seen.insert(item.as_str()))
            .map(|(item, _)| item.as_str())
            .collect()
    }
}

impl<'de> Deserialize<'de> for PatternFile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = PatternFile;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of item names to pattern rules")
            }

            fn visit_map<A>(self, mut map: A) -> Result<PatternFile, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((item, rules)) = map.next_entry::<String, Vec<PatternRule>>()? {
                    entries.push((item, rules));
                }
                Ok(PatternFile { entries })
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
