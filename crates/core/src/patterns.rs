use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternRule {
    pub min: u32,
    pub max: u32,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_multiplier() -> f64 {
    1.0
}

impl PatternRule {
    pub fn single(index: u32, tag: impl Into<String>, multiplier: f64) -> Self {
        Self::range(index, index, tag, multiplier)
    }

    pub fn range(min: u32, max: u32, tag: impl Into<String>, multiplier: f64) -> Self {
        Self {
            min,
            max,
            tag: Some(tag.into()),
            multiplier,
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn contains(&self, pattern: u32) -> bool {
        pattern >= self.min && pattern <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternMatch {
    pub tag: Option<String>,
    pub multiplier: f64,
    pub color: Option<String>,
}

impl PatternMatch {
    pub fn plain() -> Self {
        Self {
            tag: None,
            multiplier: 1.0,
            color: None,
        }
    }

    pub fn is_special(&self) -> bool {
        self.tag.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    LastWriteWins,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatternTableError {
    #[error("duplicate pattern table entry for {0}")]
    DuplicateItem(String),
    #[error("rule {index} for {item} has min {min} above max {max}")]
    InvertedRange {
        item: String,
        index: usize,
        min: u32,
        max: u32,
    },
    #[error("rule {index} for {item} has non-positive multiplier {multiplier}")]
    BadMultiplier {
        item: String,
        index: usize,
        multiplier: f64,
    },
}

/// Item name to ordered pattern rules. The first rule containing the
/// pattern index wins.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    rules: HashMap<String, Vec<PatternRule>>,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I, policy: DuplicatePolicy) -> Result<Self, PatternTableError>
    where
        I: IntoIterator<Item = (String, Vec<PatternRule>)>,
    {
        let mut table = Self::new();
        for (item, rules) in entries {
            validate_rules(&item, &rules)?;
            if table.rules.contains_key(&item) {
                match policy {
                    DuplicatePolicy::Reject => return Err(PatternTableError::DuplicateItem(item)),
                    DuplicatePolicy::LastWriteWins => {
                        log::warn!("pattern table entry for {item} replaced by a later definition");
                    }
                }
            }
            table.rules.insert(item, rules);
        }
        Ok(table)
    }

    pub fn insert(&mut self, item: impl Into<String>, rules: Vec<PatternRule>) {
        self.rules.insert(item.into(), rules);
    }

    pub fn rules_for(&self, item: &str) -> Option<&[PatternRule]> {
        self.rules.get(item).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, item: &str, pattern: u32) -> PatternMatch {
        let Some(rules) = self.rules.get(item) else {
            return PatternMatch::plain();
        };
        rules
            .iter()
            .find(|rule| rule.contains(pattern))
            .map(|rule| PatternMatch {
                tag: rule.tag.clone(),
                multiplier: rule.multiplier,
                color: rule.color.clone(),
            })
            .unwrap_or_else(PatternMatch::plain)
    }
}

fn validate_rules(item: &str, rules: &[PatternRule]) -> Result<(), PatternTableError> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.min > rule.max {
            return Err(PatternTableError::InvertedRange {
                item: item.to_string(),
                index,
                min: rule.min,
                max: rule.max,
            });
        }
        if !(rule.multiplier.is_finite() && rule.multiplier > 0.0) {
            return Err(PatternTableError::BadMultiplier {
                item: item.to_string(),
                index,
                multiplier: rule.multiplier,
            });
        }
    }
    Ok(())
}
