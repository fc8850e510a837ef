use serde::{Deserialize, Serialize};

/// The fixed rarity vocabulary used by the catalogs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RarityCode {
    Consumer,
    Industrial,
    MilSpec,
    Restricted,
    Classified,
    Covert,
    ExceedinglyRare,
}

impl RarityCode {
    pub const ALL: [RarityCode; 7] = [
        Self::Consumer,
        Self::Industrial,
        Self::MilSpec,
        Self::Restricted,
        Self::Classified,
        Self::Covert,
        Self::ExceedinglyRare,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "consumer" | "consumer_grade" => Some(Self::Consumer),
            "industrial" | "industrial_grade" => Some(Self::Industrial),
            "mil_spec" => Some(Self::MilSpec),
            "restricted" => Some(Self::Restricted),
            "classified" => Some(Self::Classified),
            "covert" => Some(Self::Covert),
            "exceedingly_rare" => Some(Self::ExceedinglyRare),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Consumer => "consumer",
            Self::Industrial => "industrial",
            Self::MilSpec => "mil_spec",
            Self::Restricted => "restricted",
            Self::Classified => "classified",
            Self::Covert => "covert",
            Self::ExceedinglyRare => "exceedingly_rare",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Consumer => "Consumer Grade",
            Self::Industrial => "Industrial Grade",
            Self::MilSpec => "Mil-Spec",
            Self::Restricted => "Restricted",
            Self::Classified => "Classified",
            Self::Covert => "Covert",
            Self::ExceedinglyRare => "Exceedingly Rare",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Consumer => "rarity-consumer",
            Self::Industrial => "rarity-industrial",
            Self::MilSpec => "rarity-mil_spec",
            Self::Restricted => "rarity-restricted",
            Self::Classified => "rarity-classified",
            Self::Covert => "rarity-covert",
            Self::ExceedinglyRare => "rarity-exceedingly_rare",
        }
    }
}

/// Label for an arbitrary catalog rarity name; unknown names are shown as-is.
pub fn rarity_label(name: &str) -> String {
    RarityCode::from_code(name)
        .map(|code| code.label().to_string())
        .unwrap_or_else(|| name.to_string())
}
