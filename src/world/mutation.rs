//! Mutations requested by the AI core
//!
//! Components never touch world state directly. They return these requests
//! and the collaborator applies them in one step per tick.

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, FactionId, UnitId, Vec2};
use crate::resource::ResourceCategory;
use crate::world::entity::UnitTask;
use crate::world::kinds::{BuildingKind, UnitKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldMutation {
    MoveUnit {
        unit: UnitId,
        position: Vec2,
    },
    DamageUnit {
        unit: UnitId,
        amount: f32,
    },
    DamageBuilding {
        building: BuildingId,
        amount: f32,
    },
    SetTask {
        unit: UnitId,
        task: UnitTask,
        target: Option<Vec2>,
    },
    /// Add a unit to a building's production queue (collaborator charges the cost)
    QueueProduction {
        building: BuildingId,
        kind: UnitKind,
    },
    /// Start construction of a building (collaborator charges the cost)
    PlaceBuilding {
        faction: FactionId,
        kind: BuildingKind,
        position: Vec2,
    },
    /// Credit extracted resources to a faction
    Deposit {
        faction: FactionId,
        category: ResourceCategory,
        amount: f32,
    },
}
