use crate::ResolvedOutcome;

const SOUVENIR_PREFIX: &str = "Souvenir ";

/// `$` followed by two decimals.
pub fn format_money(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Plain-text item title: `★` for gold tier, `Souvenir` and `StatTrak™`
/// prefixes, then the bare item name.
pub fn format_display_name(outcome: &ResolvedOutcome) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if outcome.is_gold {
        parts.push("★");
    }
    let mut name = outcome.item.name.as_str();
    if let Some(rest) = name.strip_prefix(SOUVENIR_PREFIX) {
        name = rest;
        parts.push("Souvenir");
    }
    if outcome.stat_trak {
        parts.push("StatTrak™");
    }
    parts.push(name);
    parts.join(" ")
}
