use serde::{Deserialize, Serialize};

use crate::value_objects::ApiReference;

/// Description shown for the synthetic initiative skill.
pub const INITIATIVE_DESCRIPTION: &str =
    "When determining turn order for battle you roll Dexterity (Initiative).";

/// A status effect such as "poisoned".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub desc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub desc: Vec<String>,
    pub ability_score: ApiReference,
}

impl Skill {
    /// Initiative is not a rules-API skill but is requested like one.
    pub fn initiative() -> Self {
        Self {
            index: "initiative".to_string(),
            name: "Initiative".to_string(),
            url: String::new(),
            desc: vec![INITIATIVE_DESCRIPTION.to_string()],
            ability_score: ApiReference::new("dex", "DEX"),
        }
    }
}
