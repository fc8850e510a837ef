use unboxer_core::{
    compute_price, get_level, total_xp_for, EconomyRule, ItemDefinition, LevelRule, WearCode,
    XpRule,
};

macro_rules! price_case {
    ($name:ident, $item:expr, $wear:expr, $stat_trak:expr, $expected:expr) => {
        #[test]
        fn $name() {
            let rule = EconomyRule::default();
            assert_eq!(compute_price(&$item, $wear, $stat_trak, &rule), $expected);
        }
    };
}

fn ak() -> ItemDefinition {
    ItemDefinition::new("AK-47 | Case Hardened")
        .with_price(WearCode::FactoryNew, 120.0)
        .with_price(WearCode::FieldTested, 10.0)
        .with_stattrak()
}

price_case!(price_plain_field_tested, ak(), WearCode::FieldTested, false, 10.0);
price_case!(price_stat_trak_field_tested, ak(), WearCode::FieldTested, true, 15.0);
price_case!(price_stat_trak_factory_new, ak(), WearCode::FactoryNew, true, 180.0);
price_case!(price_missing_wear_is_zero, ak(), WearCode::BattleScarred, false, 0.0);
price_case!(
    price_vanilla_uses_fixed,
    ItemDefinition::new("★ Kukri Knife | Vanilla").with_fixed_price(310.0),
    WearCode::NoWear,
    true,
    310.0
);
price_case!(
    price_vanilla_without_fixed_is_zero,
    ItemDefinition::new("★ Kukri Knife | Vanilla"),
    WearCode::NoWear,
    false,
    0.0
);
price_case!(
    price_fixed_ignores_stat_trak,
    ak().with_fixed_price(42.5),
    WearCode::FieldTested,
    true,
    42.5
);

macro_rules! xp_case {
    ($name:ident, $price:expr, $rarity:expr, $expected:expr) => {
        #[test]
        fn $name() {
            assert_eq!(XpRule::default().xp_for($price, $rarity), $expected);
        }
    };
}

xp_case!(xp_cheap_mil_spec, 2.49, "mil_spec", 1);
xp_case!(xp_expensive_covert, 95.0, "covert", 148);
xp_case!(xp_gold_bonus, 0.45, "exceedingly_rare", 500);
xp_case!(xp_classified_bonus, 10.0, "classified", 25);
xp_case!(xp_negative_price_clamped, -3.0, "restricted", 0);
xp_case!(xp_unknown_rarity, 4.0, "contraband", 2);

macro_rules! level_case {
    ($name:ident, $total:expr, $level:expr, $current:expr, $next:expr) => {
        #[test]
        fn $name() {
            let info = get_level($total, &LevelRule::default());
            assert_eq!(
                (info.level, info.current_xp, info.xp_to_next_level),
                ($level, $current, $next)
            );
        }
    };
}

level_case!(level_fresh_account, 0, 1, 0, 100);
level_case!(level_just_below_two, 99, 1, 99, 100);
level_case!(level_exactly_two, 100, 2, 0, 150);
level_case!(level_exactly_three, 250, 3, 0, 225);
level_case!(level_just_below_four, 474, 3, 224, 225);
level_case!(level_exactly_four, 475, 4, 0, 337);

macro_rules! threshold_case {
    ($name:ident, $level:expr, $expected:expr) => {
        #[test]
        fn $name() {
            let rule = LevelRule::default();
            assert_eq!(total_xp_for($level, &rule), $expected);
            assert_eq!(get_level($expected, &rule).level, $level);
        }
    };
}

threshold_case!(threshold_level_one, 1, 0);
threshold_case!(threshold_level_two, 2, 100);
threshold_case!(threshold_level_four, 4, 475);
threshold_case!(threshold_level_five, 5, 812);

macro_rules! wear_case {
    ($name:ident, $code:expr, $wear:expr, $label:expr) => {
        #[test]
        fn $name() {
            assert_eq!(WearCode::from_code($code), Some($wear));
            assert_eq!($wear.code(), $code);
            assert_eq!($wear.label(), $label);
        }
    };
}

wear_case!(wear_factory_new, "FN", WearCode::FactoryNew, "Factory New");
wear_case!(wear_minimal, "MW", WearCode::MinimalWear, "Minimal Wear");
wear_case!(wear_field_tested, "FT", WearCode::FieldTested, "Field-Tested");
wear_case!(wear_well_worn, "WW", WearCode::WellWorn, "Well-Worn");
wear_case!(wear_battle_scarred, "BS", WearCode::BattleScarred, "Battle-Scarred");
wear_case!(wear_none, "NONE", WearCode::NoWear, "No Wear");
