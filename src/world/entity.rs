//! External entities read each tick
//!
//! Units and buildings are owned by the world-state collaborator. The AI core
//! only sees snapshots of them and requests changes through mutations.

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, FactionId, TimeMs, UnitId, Vec2};
use crate::world::kinds::{BuildingKind, UnitKind};

/// What a unit is currently doing, as reported to the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitTask {
    #[default]
    Idle,
    Moving,
    Attacking,
    Gathering,
    Patrolling,
    Guarding,
}

/// A unit as seen in one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub faction: FactionId,
    pub kind: UnitKind,
    pub position: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    pub attack_range: f32,
    pub speed: f32,
    pub target: Option<Vec2>,
    pub task: UnitTask,
}

impl Unit {
    /// Create a unit at full health with its kind's combat stats
    pub fn new(id: UnitId, faction: FactionId, kind: UnitKind, position: Vec2) -> Self {
        let stats = kind.stats();
        Self {
            id,
            faction,
            kind,
            position,
            health: stats.max_health,
            max_health: stats.max_health,
            damage: stats.damage,
            attack_range: stats.attack_range,
            speed: stats.speed,
            target: None,
            task: UnitTask::Idle,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn can_fight(&self) -> bool {
        self.is_alive() && self.damage > 0.0
    }
}

/// A unit waiting in a building's production queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionItem {
    pub kind: UnitKind,
    pub remaining_ms: TimeMs,
}

/// A building as seen in one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub faction: FactionId,
    pub kind: BuildingKind,
    pub position: Vec2,
    pub constructed: bool,
    /// 0.0 to 1.0
    pub progress: f32,
    pub health: f32,
    pub max_health: f32,
    pub production_queue: Vec<ProductionItem>,
}

impl Building {
    /// Create an unfinished building (progress 0)
    pub fn new(id: BuildingId, faction: FactionId, kind: BuildingKind, position: Vec2) -> Self {
        let stats = kind.stats();
        Self {
            id,
            faction,
            kind,
            position,
            constructed: false,
            progress: 0.0,
            health: stats.max_health,
            max_health: stats.max_health,
            production_queue: Vec::new(),
        }
    }

    /// Create a finished building
    pub fn constructed(id: BuildingId, faction: FactionId, kind: BuildingKind, position: Vec2) -> Self {
        Self {
            constructed: true,
            progress: 1.0,
            ..Self::new(id, faction, kind, position)
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    pub fn queued(&self, kind: UnitKind) -> usize {
        self.production_queue.iter().filter(|item| item.kind == kind).count()
    }
}
