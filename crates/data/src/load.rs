use crate::schema::{CatalogFile, PatternFile, ProgressionFile, Settings};
use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use unboxer_core::{
    CaseDefinition, CatalogStore, DuplicatePolicy, GoalDefinition, PatternTable,
    PersistenceError, RewardEngine,
};

pub const CASES_FILE: &str = "cases.json";
pub const PATTERNS_FILE: &str = "patterns.json";
pub const PROGRESSION_FILE: &str = "progression.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Everything the simulator reads from an assets directory.
#[derive(Debug, Clone)]
pub struct Assets {
    pub cases: Vec<CaseDefinition>,
    pub patterns: PatternTable,
    pub goals: Vec<GoalDefinition>,
    pub settings: Settings,
}

impl Assets {
    pub fn case(&self, id: &str) -> Option<&CaseDefinition> {
        self.cases.iter().find(|case| case.id == id)
    }

    pub fn engine(&self) -> RewardEngine {
        RewardEngine::new(self.patterns.clone(), self.settings.economy.clone())
    }
}

pub fn load_assets(dir: &Path) -> anyhow::Result<Assets> {
    let cases = load_catalog(&dir.join(CASES_FILE))?;
    let patterns = load_pattern_table(&dir.join(PATTERNS_FILE), DuplicatePolicy::Reject)?;
    let goals = load_goals(&dir.join(PROGRESSION_FILE))?;
    let settings = load_settings(dir)?;
    log::info!(
        "loaded {} cases, {} pattern entries, {} goals from {}",
        cases.len(),
        patterns.len(),
        goals.len(),
        dir.display()
    );
    Ok(Assets {
        cases,
        patterns,
        goals,
        settings,
    })
}

/// Reads and validates a case catalog. Every case must be openable and ids
/// must be unique.
pub fn load_catalog(path: &Path) -> anyhow::Result<Vec<CaseDefinition>> {
    let file: CatalogFile = load_json(path)?;
    let mut ids = HashSet::new();
    for case in &file.cases {
        if !ids.insert(case.id.as_str()) {
            bail!("duplicate case {} in {}", case.id, path.display());
        }
        case.validate()
            .with_context(|| format!("case {} in {}", case.id, path.display()))?;
        for (rarity, items) in &case.items {
            if !case.rarities.iter().any(|tier| &tier.name == rarity) {
                log::warn!(
                    "case {} lists {} items under unknown rarity {rarity}",
                    case.id,
                    items.len()
                );
            }
        }
    }
    Ok(file.cases)
}

pub fn load_pattern_table(path: &Path, policy: DuplicatePolicy) -> anyhow::Result<PatternTable> {
    let file: PatternFile = load_json(path)?;
    let table = PatternTable::from_entries(file.entries, policy)
        .with_context(|| format!("pattern table {}", path.display()))?;
    Ok(table)
}

pub fn load_goals(path: &Path) -> anyhow::Result<Vec<GoalDefinition>> {
    let file: ProgressionFile = load_json(path)?;
    let goals = file.into_definitions();
    let mut ids = HashSet::new();
    for goal in &goals {
        if !ids.insert(goal.id.as_str()) {
            bail!("duplicate goal {} in {}", goal.id, path.display());
        }
        if goal.target == 0 {
            bail!("goal {} in {} has a zero target", goal.id, path.display());
        }
    }
    Ok(goals)
}

/// `settings.json` is optional; defaults apply when it is absent.
pub fn load_settings(dir: &Path) -> anyhow::Result<Settings> {
    let path = dir.join(SETTINGS_FILE);
    if path.exists() {
        load_json(path)
    } else {
        Ok(Settings::default())
    }
}

/// Catalog store backed by a `cases.json` file, read on first use.
#[derive(Debug, Clone)]
pub struct DirCatalogStore {
    path: PathBuf,
    cases: Option<BTreeMap<String, CaseDefinition>>,
}

impl DirCatalogStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(CASES_FILE),
            cases: None,
        }
    }

    fn cases(&mut self) -> anyhow::Result<&BTreeMap<String, CaseDefinition>> {
        if self.cases.is_none() {
            let loaded = load_catalog(&self.path)?;
            log::debug!("catalog store read {} cases", loaded.len());
            self.cases = Some(
                loaded
                    .into_iter()
                    .map(|case| (case.id.clone(), case))
                    .collect(),
            );
        }
        match &self.cases {
            Some(cases) => Ok(cases),
            None => bail!("catalog {} not loaded", self.path.display()),
        }
    }
}

impl CatalogStore for DirCatalogStore {
    fn load_catalog(&mut self, case_id: &str) -> Result<CaseDefinition, PersistenceError> {
        let cases = self
            .cases()
            .map_err(|err| PersistenceError::Catalog(format!("{err:#}")))?;
        cases
            .get(case_id)
            .cloned()
            .ok_or_else(|| PersistenceError::Catalog(format!("unknown case {case_id}")))
    }
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
