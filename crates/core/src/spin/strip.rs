use crate::{
    select_item, select_rarity, CaseDefinition, ConfigError, RandomSource, ResolvedOutcome,
    SpinConfig,
};
use serde::{Deserialize, Serialize};

/// One slot of the reveal strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripTile {
    pub name: String,
    pub rarity: String,
    pub color: String,
    pub image: String,
    /// Gold winners are shown behind the case's mystery image.
    pub masked: bool,
}

impl StripTile {
    fn decorative(name: &str, rarity: &str, color: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            rarity: rarity.to_string(),
            color: color.to_string(),
            image: image.to_string(),
            masked: false,
        }
    }

    fn winner(case: &CaseDefinition, outcome: &ResolvedOutcome) -> Self {
        let image = if outcome.is_gold {
            case.mystery_image.clone()
        } else {
            outcome.item.image.clone()
        };
        Self {
            name: outcome.item.name.clone(),
            rarity: outcome.rarity.clone(),
            color: outcome.rarity_color.clone(),
            image,
            masked: outcome.is_gold,
        }
    }
}

/// Builds the strip around an already resolved winner. Filler tiles never
/// come from the gold tier.
pub fn build_strip<R: RandomSource + ?Sized>(
    case: &CaseDefinition,
    outcome: &ResolvedOutcome,
    config: &SpinConfig,
    rng: &mut R,
) -> Result<Vec<StripTile>, ConfigError> {
    let winner_slot = config.winner_slot();
    let mut tiles = Vec::with_capacity(config.strip_length);
    for slot in 0..config.strip_length {
        if slot == winner_slot {
            tiles.push(StripTile::winner(case, outcome));
            continue;
        }
        let tier = select_rarity(&case.rarities, &case.gold_rarity, false, rng)?;
        let item = select_item(case, tier, rng)?;
        tiles.push(StripTile::decorative(
            &item.name,
            &tier.name,
            &tier.color,
            &item.image,
        ));
    }
    Ok(tiles)
}

/// Terminal offset in slot widths, kept `safe_margin` away from both edges.
pub fn draw_offset<R: RandomSource + ?Sized>(config: &SpinConfig, rng: &mut R) -> f64 {
    let margin = config.safe_margin.clamp(0.0, 0.5);
    rng.next_f64() * (1.0 - 2.0 * margin) - (0.5 - margin)
}

/// Horizontal translation that centres the winner slot in the viewport.
pub fn stop_position(winner_slot: usize, offset: f64, slot_width: f64, viewport_width: f64) -> f64 {
    -(winner_slot as f64) * slot_width + (viewport_width / 2.0 - slot_width / 2.0)
        + offset * slot_width
}

/// Tick cues that fall in `(from_ms, to_ms]` for a roll started at `start_ms`.
pub fn ticks_between(start_ms: u64, interval_ms: u64, from_ms: u64, to_ms: u64) -> u64 {
    if interval_ms == 0 || to_ms <= from_ms {
        return 0;
    }
    let elapsed = |at: u64| at.saturating_sub(start_ms) / interval_ms;
    elapsed(to_ms) - elapsed(from_ms)
}
