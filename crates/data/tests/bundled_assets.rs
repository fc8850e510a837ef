use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use unboxer_core::{
    CatalogStore, DuplicatePolicy, GoalCategory, GoalKind, PersistenceError, RngState,
    SpinConfig,
};
use unboxer_data::{
    load_assets, load_catalog, load_goals, load_pattern_table, load_settings, DirCatalogStore,
};

fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

fn unique_temp_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "unboxer_data_{}_{}_{}",
        label,
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir).expect("temp dir");
    dir
}

#[test]
fn bundled_assets_load() {
    let assets = load_assets(&assets_root()).expect("assets");
    assert!(!assets.cases.is_empty());
    assert_eq!(assets.patterns.len(), 22);
    assert_eq!(assets.goals.len(), 10);
    assert_eq!(assets.settings.spin, SpinConfig::default());
    assert_eq!(assets.settings.powerups.len(), 3);
    for case in &assets.cases {
        case.validate().expect("valid case");
    }
}

#[test]
fn bundled_goals_put_quests_first() {
    let goals = load_goals(&assets_root().join("progression.json")).expect("goals");
    let quests = goals
        .iter()
        .take_while(|goal| goal.category == GoalCategory::Quest)
        .count();
    assert_eq!(quests, 5);
    assert!(goals[quests..]
        .iter()
        .all(|goal| goal.category == GoalCategory::Achievement));

    let open_all = goals
        .iter()
        .find(|goal| goal.id == "open_all_cases")
        .expect("open all");
    match &open_all.kind {
        GoalKind::OpenAllCaseTypes { case_ids } => {
            assert_eq!(case_ids.len(), 19);
            assert_eq!(open_all.target, 19);
        }
        other => panic!("unexpected kind {other:?}"),
    }
    let spend = goals
        .iter()
        .find(|goal| goal.id == "spend_500_cases")
        .expect("spend");
    assert_eq!(spend.progress_target(), 50_000);
    assert_eq!(spend.reward.money, 1000.0);
}

#[test]
fn bundled_patterns_tag_case_hardened_knives() {
    let table = load_pattern_table(&assets_root().join("patterns.json"), DuplicatePolicy::Reject)
        .expect("patterns");
    let hit = table.evaluate("Kukri Knife | Case Hardened", 618);
    assert_eq!(hit.tag.as_deref(), Some("Blue Gem • Tier 1"));
    assert_eq!(hit.multiplier, 20.0);
    let miss = table.evaluate("Kukri Knife | Case Hardened", 1);
    assert!(miss.tag.is_none());
    assert_eq!(miss.multiplier, 1.0);
}

#[test]
fn bundled_cases_resolve_with_bundled_patterns() {
    let assets = load_assets(&assets_root()).expect("assets");
    let engine = assets.engine();
    let mut rng = RngState::from_seed(2024);
    for case in &assets.cases {
        for _ in 0..200 {
            let outcome = engine.resolve(case, &mut rng).expect("resolve");
            assert!(outcome.final_price >= 0.0);
            assert!(case.rarities.iter().any(|tier| tier.name == outcome.rarity));
        }
    }
}

#[test]
fn duplicate_pattern_keys_follow_policy() {
    let dir = unique_temp_dir("patterns");
    let path = dir.join("patterns.json");
    std::fs::write(
        &path,
        r#"{
            "Widget | Case Hardened": [{"min": 661, "max": 661, "tag": "Old", "multiplier": 2}],
            "Widget | Case Hardened": [{"min": 661, "max": 661, "tag": "New", "multiplier": 4}]
        }"#,
    )
    .expect("write");

    let err = load_pattern_table(&path, DuplicatePolicy::Reject).expect_err("duplicate");
    assert!(format!("{err:#}").contains("Widget | Case Hardened"));

    let table = load_pattern_table(&path, DuplicatePolicy::LastWriteWins).expect("later wins");
    let hit = table.evaluate("Widget | Case Hardened", 661);
    assert_eq!(hit.tag.as_deref(), Some("New"));
    assert_eq!(hit.multiplier, 4.0);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn broken_catalog_is_rejected_with_context() {
    let dir = unique_temp_dir("catalog");
    let path = dir.join("cases.json");
    std::fs::write(
        &path,
        r##"{"cases": [{
            "id": "empty",
            "price": 1.0,
            "rarities": [{"name": "covert", "weight": 1.0, "color": "#eb4b4b"}],
            "items": {}
        }]}"##,
    )
    .expect("write");

    let err = load_catalog(&path).expect_err("no items");
    let message = format!("{err:#}");
    assert!(message.contains("case empty"));
    assert!(message.contains("covert"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_settings_fall_back_to_defaults() {
    let dir = unique_temp_dir("settings");
    let settings = load_settings(&dir).expect("defaults");
    assert_eq!(settings.spin.full_reveal_ms(), 6_550);
    assert_eq!(settings.powerups.len(), 3);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn dir_catalog_store_serves_known_cases() {
    let mut store = DirCatalogStore::new(&assets_root());
    let case = store.load_catalog("kilowatt").expect("kilowatt");
    assert_eq!(case.gold_rarity, "exceedingly_rare");
    assert_eq!(case.mystery_image, "images/mystery_kukri.png");
    assert!(matches!(
        store.load_catalog("nope"),
        Err(PersistenceError::Catalog(_))
    ));

    let mut missing = DirCatalogStore::new(&unique_temp_dir("store"));
    assert!(matches!(
        missing.load_catalog("kilowatt"),
        Err(PersistenceError::Catalog(_))
    ));
}
