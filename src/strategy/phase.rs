//! Game phase from unit and building counts

use serde::{Deserialize, Serialize};

use crate::core::config::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Early,
    Mid,
    Late,
}

impl Phase {
    /// Both counts must clear a phase's thresholds. No hysteresis: losses
    /// can send a faction back to an earlier phase.
    pub fn from_counts(units: usize, buildings: usize, config: &StrategyConfig) -> Self {
        if units >= config.late_phase_units && buildings >= config.late_phase_buildings {
            Phase::Late
        } else if units >= config.mid_phase_units && buildings >= config.mid_phase_buildings {
            Phase::Mid
        } else {
            Phase::Early
        }
    }

    pub fn target_workers(&self) -> usize {
        match self {
            Phase::Early => 6,
            Phase::Mid => 10,
            Phase::Late => 14,
        }
    }

    pub fn target_army(&self) -> usize {
        match self {
            Phase::Early => 6,
            Phase::Mid => 15,
            Phase::Late => 30,
        }
    }
}
