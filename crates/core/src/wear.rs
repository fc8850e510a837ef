use crate::rng::pick_index;
use crate::{ItemDefinition, RandomSource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WearCode {
    #[serde(rename = "FN")]
    FactoryNew,
    #[serde(rename = "MW")]
    MinimalWear,
    #[serde(rename = "FT")]
    FieldTested,
    #[serde(rename = "WW")]
    WellWorn,
    #[serde(rename = "BS")]
    BattleScarred,
    #[serde(rename = "NONE")]
    NoWear,
}

impl WearCode {
    pub fn code(self) -> &'static str {
        match self {
            Self::FactoryNew => "FN",
            Self::MinimalWear => "MW",
            Self::FieldTested => "FT",
            Self::WellWorn => "WW",
            Self::BattleScarred => "BS",
            Self::NoWear => "NONE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FactoryNew => "Factory New",
            Self::MinimalWear => "Minimal Wear",
            Self::FieldTested => "Field-Tested",
            Self::WellWorn => "Well-Worn",
            Self::BattleScarred => "Battle-Scarred",
            Self::NoWear => "No Wear",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FN" => Some(Self::FactoryNew),
            "MW" => Some(Self::MinimalWear),
            "FT" => Some(Self::FieldTested),
            "WW" => Some(Self::WellWorn),
            "BS" => Some(Self::BattleScarred),
            "NONE" => Some(Self::NoWear),
            _ => None,
        }
    }
}

/// A wear band covering `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WearTier {
    pub code: WearCode,
    pub min: f64,
    pub max: f64,
}

impl WearTier {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }

    fn overlaps(&self, range: FloatRange) -> bool {
        self.max > range.min && self.min < range.max
    }
}

pub const WEAR_TIERS: [WearTier; 5] = [
    WearTier {
        code: WearCode::FactoryNew,
        min: 0.0,
        max: 0.07,
    },
    WearTier {
        code: WearCode::MinimalWear,
        min: 0.07,
        max: 0.15,
    },
    WearTier {
        code: WearCode::FieldTested,
        min: 0.15,
        max: 0.38,
    },
    WearTier {
        code: WearCode::WellWorn,
        min: 0.38,
        max: 0.45,
    },
    WearTier {
        code: WearCode::BattleScarred,
        min: 0.45,
        max: 1.0,
    },
];

pub fn wear_tier(code: WearCode) -> Option<&'static WearTier> {
    WEAR_TIERS.iter().find(|tier| tier.code == code)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl FloatRange {
    pub const FULL: FloatRange = FloatRange { min: 0.0, max: 1.0 };

    /// Parses `"a-b"`. Endpoints are sorted and clamped to `[0, 1]`;
    /// anything unusable (missing, non-numeric, empty span) yields the full range.
    pub fn parse_or_full(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(Self::FULL)
    }

    fn parse(raw: &str) -> Option<Self> {
        let (a, b) = raw.trim().split_once('-')?;
        let a: f64 = a.trim().parse().ok()?;
        let b: f64 = b.trim().parse().ok()?;
        if !a.is_finite() || !b.is_finite() {
            return None;
        }
        let min = a.min(b).clamp(0.0, 1.0);
        let max = a.max(b).clamp(0.0, 1.0);
        if max <= min {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearRoll {
    pub code: WearCode,
    pub float_value: Option<f64>,
}

impl WearRoll {
    pub fn none() -> Self {
        Self {
            code: WearCode::NoWear,
            float_value: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.code.label()
    }

    /// Nine decimal places; `0.000000000` when the item has no wear.
    pub fn float_text(&self) -> String {
        format!("{:.9}", self.float_value.unwrap_or(0.0))
    }
}

/// Picks one wear band uniformly among the bands the item can reach, then a
/// float uniformly inside the band clipped to the item's range.
pub fn roll_wear<R: RandomSource + ?Sized>(item: &ItemDefinition, rng: &mut R) -> WearRoll {
    if item.is_vanilla() {
        return WearRoll::none();
    }
    let range = item.float_bounds();
    let allowed: Vec<&WearTier> = WEAR_TIERS.iter().filter(|t| t.overlaps(range)).collect();
    let tier = allowed[pick_index(rng, allowed.len())];

    let low = tier.min.max(range.min);
    let high = tier.max.min(range.max);
    let value = low + rng.next_f64() * (high - low);

    WearRoll {
        code: tier.code,
        float_value: Some(value),
    }
}
