use crate::rng::{pick_inclusive, pick_index};
use crate::{
    roll_wear, CaseDefinition, ConfigError, EconomyRule, ItemDefinition, PatternTable,
    RandomSource, RarityTier, WearCode,
};
use serde::{Deserialize, Serialize};

/// Shown for a tagged pattern whose rule carries no color of its own.
pub const DEFAULT_PATTERN_COLOR: &str = "#ffd700";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedOutcome {
    pub item: ItemDefinition,
    pub rarity: String,
    pub rarity_color: String,
    pub is_gold: bool,
    pub wear_code: WearCode,
    pub wear_label: String,
    /// Nine decimal places.
    pub float_value: String,
    pub stat_trak: bool,
    pub pattern_index: Option<u32>,
    pub pattern_tag: Option<String>,
    pub pattern_color: Option<String>,
    pub pattern_multiplier: f64,
    pub base_price: f64,
    pub final_price: f64,
}

impl ResolvedOutcome {
    pub fn is_highlight(&self) -> bool {
        self.is_gold || self.pattern_tag.is_some()
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted draw over the pool in declaration order. With `include_top`
/// unset the case's top tier is left out of the draw.
pub fn select_rarity<'a, R: RandomSource + ?Sized>(
    pool: &'a [RarityTier],
    top_tier: &str,
    include_top: bool,
    rng: &mut R,
) -> Result<&'a RarityTier, ConfigError> {
    let eligible: Vec<&RarityTier> = pool
        .iter()
        .filter(|tier| include_top || tier.name != top_tier)
        .collect();
    if eligible.is_empty() {
        return Err(ConfigError::EmptyRarityPool);
    }
    let weighted: Vec<&RarityTier> = eligible
        .into_iter()
        .filter(|tier| tier.weight.is_finite() && tier.weight > 0.0)
        .collect();
    let Some(last) = weighted.last().copied() else {
        return Err(ConfigError::NoPositiveWeight);
    };
    let total: f64 = weighted.iter().map(|tier| tier.weight).sum();
    let mut roll = rng.next_f64() * total;
    for tier in weighted {
        roll -= tier.weight;
        if roll <= 0.0 {
            return Ok(tier);
        }
    }
    Ok(last)
}

pub fn select_item<'a, R: RandomSource + ?Sized>(
    case: &'a CaseDefinition,
    tier: &RarityTier,
    rng: &mut R,
) -> Result<&'a ItemDefinition, ConfigError> {
    let items = case.items_for(&tier.name);
    if items.is_empty() {
        return Err(ConfigError::EmptyItemList(tier.name.clone()));
    }
    Ok(&items[pick_index(rng, items.len())])
}

pub fn roll_stat_trak<R: RandomSource + ?Sized>(
    item: &ItemDefinition,
    rule: &EconomyRule,
    rng: &mut R,
) -> bool {
    if item.is_vanilla() || !item.stattrak_available {
        return false;
    }
    rng.next_f64() < rule.stattrak_chance
}

pub fn roll_pattern<R: RandomSource + ?Sized>(rule: &EconomyRule, rng: &mut R) -> u32 {
    pick_inclusive(rng, rule.pattern_min, rule.pattern_max)
}

pub fn compute_price(
    item: &ItemDefinition,
    wear: WearCode,
    stat_trak: bool,
    rule: &EconomyRule,
) -> f64 {
    if item.is_vanilla() || item.fixed_price.is_some() {
        return round_cents(item.fixed_price.unwrap_or(0.0));
    }
    let base = round_cents(item.price_for(wear));
    if stat_trak {
        round_cents(base * rule.stattrak_multiplier)
    } else {
        base
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewardEngine {
    patterns: PatternTable,
    economy: EconomyRule,
}

impl RewardEngine {
    pub fn new(patterns: PatternTable, economy: EconomyRule) -> Self {
        Self { patterns, economy }
    }

    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    pub fn economy(&self) -> &EconomyRule {
        &self.economy
    }

    /// Draws the winner of a case open and everything attached to it.
    pub fn resolve<R: RandomSource + ?Sized>(
        &self,
        case: &CaseDefinition,
        rng: &mut R,
    ) -> Result<ResolvedOutcome, ConfigError> {
        let tier = select_rarity(&case.rarities, &case.gold_rarity, true, rng)?;
        let item = select_item(case, tier, rng)?;
        Ok(self.finalize(case, tier, item, rng))
    }

    /// Rolls wear, StatTrak and pattern for an already drawn item and prices it.
    pub fn finalize<R: RandomSource + ?Sized>(
        &self,
        case: &CaseDefinition,
        tier: &RarityTier,
        item: &ItemDefinition,
        rng: &mut R,
    ) -> ResolvedOutcome {
        let wear = roll_wear(item, rng);
        let stat_trak = roll_stat_trak(item, &self.economy, rng);

        let mut pattern_index = None;
        let mut pattern_tag = None;
        let mut pattern_color = None;
        let mut pattern_multiplier = 1.0;
        if !item.is_vanilla() {
            let pattern = roll_pattern(&self.economy, rng);
            let hit = self.patterns.evaluate(&item.name, pattern);
            if hit.is_special() {
                pattern_color = Some(
                    hit.color
                        .clone()
                        .unwrap_or_else(|| DEFAULT_PATTERN_COLOR.to_string()),
                );
            }
            pattern_index = Some(pattern);
            pattern_tag = hit.tag;
            pattern_multiplier = hit.multiplier;
        }

        let base_price = compute_price(item, wear.code, stat_trak, &self.economy);
        let final_price = round_cents(base_price * pattern_multiplier);

        ResolvedOutcome {
            item: item.clone(),
            rarity: tier.name.clone(),
            rarity_color: tier.color.clone(),
            is_gold: case.is_gold(&tier.name),
            wear_code: wear.code,
            wear_label: wear.label().to_string(),
            float_value: wear.float_text(),
            stat_trak,
            pattern_index,
            pattern_tag,
            pattern_color,
            pattern_multiplier,
            base_price,
            final_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PatternRule, RngState, ScriptedSource};

    fn pool() -> Vec<RarityTier> {
        vec![
            RarityTier::new("common", 70.0, "#b0c3d9"),
            RarityTier::new("rare", 25.0, "#4b69ff"),
            RarityTier::new("legendary", 5.0, "#eb4b4b"),
        ]
    }

    #[test]
    fn weighted_draw_converges() {
        let pool = pool();
        let mut rng = RngState::from_seed(0xC0FFEE);
        let mut legendary = 0u32;
        let draws = 100_000;
        for _ in 0..draws {
            let tier = select_rarity(&pool, "none", true, &mut rng).expect("tier");
            if tier.name == "legendary" {
                legendary += 1;
            }
        }
        let freq = legendary as f64 / draws as f64;
        assert!((freq - 0.05).abs() < 0.01, "legendary frequency {freq}");
    }

    #[test]
    fn boundaries_pick_expected_tiers() {
        let pool = pool();
        let mut rng = ScriptedSource::new([0.0, 0.7, 0.70001, 0.95, 0.999_999]);
        let picks: Vec<&str> = (0..5)
            .map(|_| select_rarity(&pool, "none", true, &mut rng).unwrap().name.as_str())
            .collect();
        assert_eq!(picks, ["common", "common", "rare", "rare", "legendary"]);
    }

    #[test]
    fn top_tier_excluded_on_request() {
        let pool = pool();
        let mut rng = RngState::from_seed(9);
        for _ in 0..2000 {
            let tier = select_rarity(&pool, "legendary", false, &mut rng).unwrap();
            assert_ne!(tier.name, "legendary");
        }
    }

    #[test]
    fn zero_weight_tiers_never_drawn() {
        let pool = vec![
            RarityTier::new("ghost", 0.0, ""),
            RarityTier::new("real", 1.0, ""),
            RarityTier::new("ghost2", 0.0, ""),
        ];
        let mut rng = ScriptedSource::new([0.0, 0.999_999]);
        assert_eq!(select_rarity(&pool, "x", true, &mut rng).unwrap().name, "real");
        assert_eq!(select_rarity(&pool, "x", true, &mut rng).unwrap().name, "real");
    }

    #[test]
    fn empty_pools_are_configuration_errors() {
        let mut rng = ScriptedSource::new([]);
        assert_eq!(
            select_rarity(&[], "x", true, &mut rng),
            Err(ConfigError::EmptyRarityPool)
        );
        let only_top = vec![RarityTier::new("gold", 1.0, "")];
        assert_eq!(
            select_rarity(&only_top, "gold", false, &mut rng),
            Err(ConfigError::EmptyRarityPool)
        );
        let case = CaseDefinition::new("c", 1.0).with_rarity(RarityTier::new("a", 1.0, ""), vec![]);
        assert_eq!(
            select_item(&case, &case.rarities[0], &mut rng),
            Err(ConfigError::EmptyItemList("a".to_string()))
        );
    }

    #[test]
    fn stat_trak_price_scaling() {
        let rule = EconomyRule::default();
        let item = ItemDefinition::new("M4A4 | Howl")
            .with_price(WearCode::FieldTested, 100.0)
            .with_price(WearCode::MinimalWear, 33.33)
            .with_stattrak();
        assert_eq!(compute_price(&item, WearCode::FieldTested, true, &rule), 150.0);
        for wear in [WearCode::FieldTested, WearCode::MinimalWear, WearCode::BattleScarred] {
            let plain = compute_price(&item, wear, false, &rule);
            let boosted = compute_price(&item, wear, true, &rule);
            assert_eq!(boosted, round_cents(plain * 1.5));
        }
        assert_eq!(compute_price(&item, WearCode::BattleScarred, false, &rule), 0.0);
    }

    #[test]
    fn fixed_price_items_ignore_wear() {
        let rule = EconomyRule::default();
        let vanilla = ItemDefinition::new("Kukri Knife | Vanilla").with_fixed_price(412.456);
        assert_eq!(compute_price(&vanilla, WearCode::NoWear, true, &rule), 412.46);
        let bare = ItemDefinition::new("Karambit | Vanilla");
        assert_eq!(compute_price(&bare, WearCode::NoWear, false, &rule), 0.0);
    }

    #[test]
    fn stat_trak_only_for_eligible_items() {
        let rule = EconomyRule::default();
        let eligible = ItemDefinition::new("AK-47 | Redline").with_stattrak();
        let plain = ItemDefinition::new("AK-47 | Safari Mesh");
        let vanilla = ItemDefinition::new("Bayonet | Vanilla").with_stattrak();
        let mut rng = ScriptedSource::new([0.05, 0.15]);
        assert!(roll_stat_trak(&eligible, &rule, &mut rng));
        assert!(!roll_stat_trak(&eligible, &rule, &mut rng));
        assert!(!roll_stat_trak(&plain, &rule, &mut ScriptedSource::new([0.0])));
        assert!(!roll_stat_trak(&vanilla, &rule, &mut ScriptedSource::new([0.0])));
    }

    #[test]
    fn pattern_roll_covers_bounds() {
        let rule = EconomyRule::default();
        assert_eq!(roll_pattern(&rule, &mut ScriptedSource::new([0.0])), 1);
        assert_eq!(roll_pattern(&rule, &mut ScriptedSource::new([0.999_999_9])), 999);
        let mut rng = RngState::from_seed(5);
        for _ in 0..5000 {
            let pattern = roll_pattern(&rule, &mut rng);
            assert!((1..=999).contains(&pattern));
        }
    }

    fn widget_case() -> CaseDefinition {
        CaseDefinition::new("widgets", 2.5)
            .with_rarity(
                RarityTier::new("covert", 1.0, "#eb4b4b"),
                vec![ItemDefinition::new("Widget | Case Hardened")
                    .with_price(WearCode::FactoryNew, 100.0)
                    .with_float_range("0.00-0.07")
                    .with_stattrak()],
            )
    }

    fn widget_engine() -> RewardEngine {
        let mut patterns = PatternTable::new();
        patterns.insert(
            "Widget | Case Hardened",
            vec![PatternRule::single(661, "Blue Gem", 4.0)],
        );
        RewardEngine::new(patterns, EconomyRule::default())
    }

    #[test]
    fn resolve_applies_stat_trak_then_pattern() {
        let case = widget_case();
        let engine = widget_engine();
        // rarity, item, wear tier, float, stattrak, pattern (661)
        let mut rng = ScriptedSource::new([0.1, 0.0, 0.0, 0.5, 0.01, 660.0 / 999.0 + 1e-9]);
        let outcome = engine.resolve(&case, &mut rng).expect("resolve");
        assert_eq!(outcome.wear_code, WearCode::FactoryNew);
        assert_eq!(outcome.float_value, "0.035000000");
        assert!(outcome.stat_trak);
        assert_eq!(outcome.pattern_index, Some(661));
        assert_eq!(outcome.pattern_tag.as_deref(), Some("Blue Gem"));
        assert_eq!(outcome.pattern_color.as_deref(), Some(DEFAULT_PATTERN_COLOR));
        assert_eq!(outcome.base_price, 150.0);
        assert_eq!(outcome.final_price, 600.0);
        assert!(outcome.is_highlight());
    }

    #[test]
    fn resolve_without_pattern_bonus() {
        let case = widget_case();
        let engine = widget_engine();
        let mut rng = ScriptedSource::new([0.1, 0.0, 0.0, 0.5, 0.5, 0.0]);
        let outcome = engine.resolve(&case, &mut rng).expect("resolve");
        assert!(!outcome.stat_trak);
        assert_eq!(outcome.pattern_index, Some(1));
        assert_eq!(outcome.pattern_tag, None);
        assert_eq!(outcome.pattern_color, None);
        assert_eq!(outcome.final_price, 100.0);
        assert!(!outcome.is_gold);
    }

    #[test]
    fn vanilla_outcome_skips_rolls() {
        let case = CaseDefinition::new("knives", 2.5).with_rarity(
            RarityTier::new("exceedingly_rare", 1.0, "#f1c40f"),
            vec![ItemDefinition::new("Kukri Knife | Vanilla")
                .with_fixed_price(250.0)
                .with_stattrak()],
        );
        let engine = RewardEngine::default();
        let mut rng = ScriptedSource::new([0.3, 0.0]);
        let outcome = engine.resolve(&case, &mut rng).expect("resolve");
        assert_eq!(rng.remaining(), 0);
        assert!(outcome.is_gold);
        assert_eq!(outcome.wear_code, WearCode::NoWear);
        assert_eq!(outcome.wear_label, "No Wear");
        assert_eq!(outcome.pattern_index, None);
        assert!(!outcome.stat_trak);
        assert_eq!(outcome.final_price, 250.0);
    }

    #[test]
    fn same_seed_same_outcome() {
        let case = widget_case();
        let engine = widget_engine();
        let a = engine.resolve(&case, &mut RngState::from_seed(77)).unwrap();
        let b = engine.resolve(&case, &mut RngState::from_seed(77)).unwrap();
        assert_eq!(a, b);
    }
}
