//! Planner personality knobs set from config

use serde::{Deserialize, Serialize};

use crate::resource::ResourceCategory;

/// How eagerly the planner commits its army
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggressionPosture {
    /// Always attack the nearest enemy
    Aggressive,
    /// Attack the weakest enemy building
    #[default]
    Balanced,
    /// Only counter-attack enemies already close to the base
    Defensive,
}

impl AggressionPosture {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "aggressive" => Some(Self::Aggressive),
            "balanced" => Some(Self::Balanced),
            "defensive" => Some(Self::Defensive),
            _ => None,
        }
    }
}

/// Which resource the economy leans toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourcePriority {
    /// Favor whichever category the faction holds less of
    #[default]
    Balanced,
    OilPriority,
    SteelPriority,
}

impl ResourcePriority {
    /// Multiplier on a zone's travel score; lower is preferred
    pub fn weight(&self, category: ResourceCategory, scarce: ResourceCategory) -> f32 {
        match (self, category) {
            (ResourcePriority::OilPriority, ResourceCategory::Oil)
            | (ResourcePriority::SteelPriority, ResourceCategory::Steel) => 0.5,
            (ResourcePriority::OilPriority, _) | (ResourcePriority::SteelPriority, _) => 1.5,
            (ResourcePriority::Balanced, c) if c == scarce => 0.8,
            (ResourcePriority::Balanced, _) => 1.0,
        }
    }
}
