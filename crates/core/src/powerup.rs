use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_ms: u64,
    #[serde(default = "unit")]
    pub click_mult: f64,
    #[serde(default = "unit")]
    pub passive_mult: f64,
}

fn unit() -> f64 {
    1.0
}

impl PowerupDef {
    pub fn new(id: &str, name: &str, duration_ms: u64, click_mult: f64, passive_mult: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            duration_ms,
            click_mult,
            passive_mult,
        }
    }
}

pub fn builtin_powerups() -> Vec<PowerupDef> {
    vec![
        PowerupDef::new("frenzy", "Click Frenzy", 30_000, 7.0, 1.0),
        PowerupDef::new("rain", "Case Rain", 30_000, 1.0, 3.0),
        PowerupDef::new("storm", "Case Storm", 20_000, 2.0, 2.0),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupInstance {
    pub def: PowerupDef,
    pub started_at_ms: u64,
    pub ends_at_ms: u64,
}

impl PowerupInstance {
    pub fn is_active(&self, now_ms: u64) -> bool {
        self.ends_at_ms > now_ms
    }

    pub fn seconds_left(&self, now_ms: u64) -> u64 {
        self.ends_at_ms.saturating_sub(now_ms).div_ceil(1000)
    }
}

/// Overlapping timed boosts. Instances stack multiplicatively.
#[derive(Debug, Clone, Default)]
pub struct ActivePowerups {
    active: Vec<PowerupInstance>,
}

impl ActivePowerups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, def: &PowerupDef, now_ms: u64) {
        log::debug!("powerup {} active for {}ms", def.id, def.duration_ms);
        self.active.push(PowerupInstance {
            def: def.clone(),
            started_at_ms: now_ms,
            ends_at_ms: now_ms.saturating_add(def.duration_ms),
        });
    }

    /// Drops expired instances; returns how many were removed.
    pub fn prune(&mut self, now_ms: u64) -> usize {
        let before = self.active.len();
        self.active.retain(|instance| instance.is_active(now_ms));
        before - self.active.len()
    }

    pub fn instances(&self) -> &[PowerupInstance] {
        &self.active
    }

    /// Product over the instances still running at `now_ms`.
    pub fn click_multiplier(&self, now_ms: u64) -> f64 {
        self.running(now_ms).map(|p| p.def.click_mult).product()
    }

    pub fn passive_multiplier(&self, now_ms: u64) -> f64 {
        self.running(now_ms).map(|p| p.def.passive_mult).product()
    }

    fn running(&self, now_ms: u64) -> impl Iterator<Item = &PowerupInstance> + '_ {
        self.active.iter().filter(move |p| p.is_active(now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_boosts_multiply_until_expiry() {
        let defs = builtin_powerups();
        let mut active = ActivePowerups::new();
        assert_eq!(active.click_multiplier(0), 1.0);

        active.apply(&defs[0], 0);
        active.apply(&defs[2], 10_000);
        assert_eq!(active.click_multiplier(10_000), 14.0);
        assert_eq!(active.passive_multiplier(10_000), 2.0);
        assert_eq!(active.instances()[1].seconds_left(10_001), 20);

        assert_eq!(active.prune(29_999), 0);
        assert_eq!(active.prune(30_000), 2);
        assert_eq!(active.click_multiplier(30_000), 1.0);
    }

    #[test]
    fn expired_boosts_stop_counting_before_prune() {
        let defs = builtin_powerups();
        let mut active = ActivePowerups::new();
        active.apply(&defs[0], 0);
        active.apply(&defs[1], 20_000);

        assert_eq!(active.click_multiplier(29_999), 7.0);
        assert_eq!(active.click_multiplier(30_000), 1.0);
        assert_eq!(active.passive_multiplier(30_000), 3.0);
        assert_eq!(active.click_multiplier(1_000_000), 1.0);
        assert_eq!(active.passive_multiplier(1_000_000), 1.0);
        assert_eq!(active.instances().len(), 2);
    }

    #[test]
    fn defaults_fill_missing_multipliers() {
        let def: PowerupDef =
            serde_json::from_str(r#"{"id":"rain","name":"Case Rain","duration_ms":30000,"passive_mult":3}"#)
                .expect("parse");
        assert_eq!(def.click_mult, 1.0);
        assert_eq!(def.passive_mult, 3.0);
    }
}
