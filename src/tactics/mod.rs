//! Group tactics and threat tracking

pub mod formation;
pub mod groups;
pub mod threat;

pub use formation::{formation_offsets, FormationShape, GroupRole};
pub use groups::{CombatGroup, CombatGroupManager, GroupMember};
pub use threat::{threat_score, ThreatAssessment, ThreatEntry};
