//! Long-horizon planning for AI factions

pub mod phase;
pub mod planner;
pub mod plans;
pub mod posture;

pub use phase::Phase;
pub use planner::{StrategicAI, StrategicContext};
pub use plans::{preferred_mix, EconomicPlan, MilitaryPlan, Objective, StrategicState};
pub use posture::{AggressionPosture, ResourcePriority};
