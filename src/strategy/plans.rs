//! Planner state owned by one faction's StrategicAI

use std::collections::VecDeque;

use serde::Serialize;

use crate::core::types::{TimeMs, Vec2};
use crate::strategy::phase::Phase;
use crate::strategy::posture::ResourcePriority;
use crate::world::{BuildingKind, UnitKind};

#[derive(Debug, Clone, Serialize)]
pub struct EconomicPlan {
    pub target_workers: usize,
    pub resource_priority: ResourcePriority,
    pub building_queue: VecDeque<BuildingKind>,
    pub next_build_ms: TimeMs,
    pub expansions: usize,
}

impl EconomicPlan {
    pub fn new(phase: Phase, resource_priority: ResourcePriority) -> Self {
        Self {
            target_workers: phase.target_workers(),
            resource_priority,
            building_queue: VecDeque::new(),
            next_build_ms: 0,
            expansions: 0,
        }
    }

    pub fn queued(&self, kind: BuildingKind) -> usize {
        self.building_queue.iter().filter(|k| **k == kind).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MilitaryPlan {
    pub preferred_mix: Vec<UnitKind>,
    pub target_army: usize,
    /// Army size required before a large attack
    pub attack_threshold: usize,
    pub last_attack_ms: Option<TimeMs>,
    pub production_queue: VecDeque<UnitKind>,
}

impl MilitaryPlan {
    pub fn new(phase: Phase, attack_threshold: usize) -> Self {
        Self {
            preferred_mix: preferred_mix(phase, false),
            target_army: phase.target_army(),
            attack_threshold,
            last_attack_ms: None,
            production_queue: VecDeque::new(),
        }
    }
}

/// Unit kinds to favor when topping up the army
pub fn preferred_mix(phase: Phase, under_pressure: bool) -> Vec<UnitKind> {
    if under_pressure {
        return vec![UnitKind::Tank, UnitKind::Artillery, UnitKind::MissileLauncher];
    }
    match phase {
        Phase::Early => vec![UnitKind::Infantry, UnitKind::Infantry, UnitKind::Scout],
        Phase::Mid => vec![UnitKind::Infantry, UnitKind::Tank, UnitKind::Gunship],
        Phase::Late => vec![
            UnitKind::Tank,
            UnitKind::Artillery,
            UnitKind::Gunship,
            UnitKind::MissileLauncher,
        ],
    }
}

/// What the planner is currently pursuing, recomputed every decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    GrowEconomy,
    BuildArmy,
    DefendBase,
    Expand,
    Scout,
    Attack,
}

/// Everything one planner knows about its own faction
#[derive(Debug, Clone, Serialize)]
pub struct StrategicState {
    pub phase: Phase,
    pub economy: EconomicPlan,
    pub military: MilitaryPlan,
    pub objectives: Vec<Objective>,
    pub threat_level: f32,
    /// Distance from the main base the faction considers its own
    pub controlled_radius: f32,
    /// Fixed defensive posts around the main base, set once
    pub perimeter: Vec<Vec2>,
}

impl StrategicState {
    pub fn new(resource_priority: ResourcePriority, attack_threshold: usize) -> Self {
        let phase = Phase::Early;
        Self {
            phase,
            economy: EconomicPlan::new(phase, resource_priority),
            military: MilitaryPlan::new(phase, attack_threshold),
            objectives: Vec::new(),
            threat_level: 0.0,
            controlled_radius: 0.0,
            perimeter: Vec::new(),
        }
    }
}
