use crate::{FloatRange, WearCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_GOLD_RARITY: &str = "exceedingly_rare";
pub const DEFAULT_MYSTERY_IMAGE: &str = "images/mystery.png";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("rarity pool is empty")]
    EmptyRarityPool,
    #[error("no rarity in the pool has a positive weight")]
    NoPositiveWeight,
    #[error("rarity {rarity} has an invalid weight {weight}")]
    InvalidWeight { rarity: String, weight: f64 },
    #[error("no items listed for rarity {0}")]
    EmptyItemList(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RarityTier {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub color: String,
}

impl RarityTier {
    pub fn new(name: impl Into<String>, weight: f64, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight,
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ItemDefinition {
    pub name: String,
    #[serde(default)]
    pub image: String,
    /// Wear code (`FN`, `MW`, ...) to price.
    #[serde(default)]
    pub price: BTreeMap<String, f64>,
    /// Written as `"min-max"`, e.g. `"0.00-0.80"`.
    #[serde(default)]
    pub float_range: Option<String>,
    #[serde(default)]
    pub stattrak_available: bool,
    #[serde(default)]
    pub fixed_price: Option<f64>,
}

impl ItemDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_price(mut self, wear: WearCode, price: f64) -> Self {
        self.price.insert(wear.code().to_string(), price);
        self
    }

    pub fn with_float_range(mut self, range: impl Into<String>) -> Self {
        self.float_range = Some(range.into());
        self
    }

    pub fn with_stattrak(mut self) -> Self {
        self.stattrak_available = true;
        self
    }

    pub fn with_fixed_price(mut self, price: f64) -> Self {
        self.fixed_price = Some(price);
        self
    }

    /// Vanilla items carry no wear, pattern or StatTrak.
    pub fn is_vanilla(&self) -> bool {
        self.name.to_lowercase().contains("vanilla")
    }

    pub fn is_special(&self) -> bool {
        self.name.to_lowercase().contains("gloves")
    }

    pub fn float_bounds(&self) -> FloatRange {
        FloatRange::parse_or_full(self.float_range.as_deref())
    }

    pub fn price_for(&self, wear: WearCode) -> f64 {
        self.price.get(wear.code()).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub price: f64,
    pub rarities: Vec<RarityTier>,
    pub items: BTreeMap<String, Vec<ItemDefinition>>,
    #[serde(default = "default_gold_rarity")]
    pub gold_rarity: String,
    #[serde(default = "default_mystery_image")]
    pub mystery_image: String,
}

fn default_gold_rarity() -> String {
    DEFAULT_GOLD_RARITY.to_string()
}

fn default_mystery_image() -> String {
    DEFAULT_MYSTERY_IMAGE.to_string()
}

impl CaseDefinition {
    pub fn new(id: impl Into<String>, price: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            price,
            rarities: Vec::new(),
            items: BTreeMap::new(),
            gold_rarity: default_gold_rarity(),
            mystery_image: default_mystery_image(),
        }
    }

    pub fn with_rarity(mut self, tier: RarityTier, items: Vec<ItemDefinition>) -> Self {
        self.items.insert(tier.name.clone(), items);
        self.rarities.push(tier);
        self
    }

    pub fn items_for(&self, rarity: &str) -> &[ItemDefinition] {
        self.items.get(rarity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_gold(&self, rarity: &str) -> bool {
        self.gold_rarity == rarity
    }

    /// Checks everything a resolution can trip over, so that a broken case
    /// is rejected before any funds move.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rarities.is_empty() {
            return Err(ConfigError::EmptyRarityPool);
        }
        for tier in &self.rarities {
            if !tier.weight.is_finite() || tier.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    rarity: tier.name.clone(),
                    weight: tier.weight,
                });
            }
        }
        if !self.rarities.iter().any(|tier| tier.weight > 0.0) {
            return Err(ConfigError::NoPositiveWeight);
        }
        for tier in self.rarities.iter().filter(|tier| tier.weight > 0.0) {
            if self.items_for(&tier.name).is_empty() {
                return Err(ConfigError::EmptyItemList(tier.name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EconomyRule {
    pub stattrak_chance: f64,
    pub stattrak_multiplier: f64,
    pub pattern_min: u32,
    pub pattern_max: u32,
}

impl Default for EconomyRule {
    fn default() -> Self {
        Self {
            stattrak_chance: 0.1,
            stattrak_multiplier: 1.5,
            pattern_min: 1,
            pattern_max: 999,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpinConfig {
    pub strip_length: usize,
    pub winner_index: usize,
    pub reveal_ms: u64,
    pub settle_grace_ms: u64,
    pub skip_ms: u64,
    pub skip_grace_ms: u64,
    pub tick_interval_ms: u64,
    /// Fraction of a slot kept clear on each side of the stopping point.
    pub safe_margin: f64,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            strip_length: 100,
            winner_index: 80,
            reveal_ms: 6500,
            settle_grace_ms: 50,
            skip_ms: 300,
            skip_grace_ms: 20,
            tick_interval_ms: 80,
            safe_margin: 0.05,
        }
    }
}

impl SpinConfig {
    pub fn full_reveal_ms(&self) -> u64 {
        self.reveal_ms + self.settle_grace_ms
    }

    pub fn skip_reveal_ms(&self) -> u64 {
        self.skip_ms + self.skip_grace_ms
    }

    /// The winner slot, clamped into the strip.
    pub fn winner_slot(&self) -> usize {
        self.winner_index.min(self.strip_length.saturating_sub(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LevelRule {
    pub base_xp: u64,
    pub multiplier: f64,
}

impl Default for LevelRule {
    fn default() -> Self {
        Self {
            base_xp: 100,
            multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RarityBonus {
    pub rarity: String,
    pub xp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct XpRule {
    pub case_cost_factor: f64,
    pub rarity_bonus: Vec<RarityBonus>,
}

impl Default for XpRule {
    fn default() -> Self {
        Self {
            case_cost_factor: 0.5,
            rarity_bonus: vec![
                RarityBonus {
                    rarity: "classified".to_string(),
                    xp: 20,
                },
                RarityBonus {
                    rarity: "covert".to_string(),
                    xp: 100,
                },
                RarityBonus {
                    rarity: DEFAULT_GOLD_RARITY.to_string(),
                    xp: 500,
                },
            ],
        }
    }
}

impl XpRule {
    pub fn xp_for(&self, case_price: f64, rarity: &str) -> u64 {
        let base = (case_price.max(0.0) * self.case_cost_factor).round() as u64;
        let bonus = self
            .rarity_bonus
            .iter()
            .find(|entry| entry.rarity == rarity)
            .map(|entry| entry.xp)
            .unwrap_or(0);
        base + bonus
    }
}
