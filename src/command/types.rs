//! Unit commands: one active directive per unit

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, CommandId, TimeMs, UnitId, Vec2, ZoneId};
use crate::world::UnitTask;

/// Kind of command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Move,
    Attack,
    Gather,
    Patrol,
    Guard,
}

impl CommandKind {
    /// Task tag reported to the world while this command runs
    pub fn task(&self) -> UnitTask {
        match self {
            CommandKind::Move => UnitTask::Moving,
            CommandKind::Attack => UnitTask::Attacking,
            CommandKind::Gather => UnitTask::Gathering,
            CommandKind::Patrol => UnitTask::Patrolling,
            CommandKind::Guard => UnitTask::Guarding,
        }
    }
}

/// What a command points at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CommandTarget {
    Position(Vec2),
    Unit(UnitId),
    Building(BuildingId),
    Zone(ZoneId),
}

/// Recorded on every command; conflicts are still resolved last-write-wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum CommandPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Who issued a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandIssuer {
    Ai,
    External,
}

/// A kind paired with a compatible target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub kind: CommandKind,
    pub target: CommandTarget,
}

impl Order {
    pub fn move_to(position: Vec2) -> Self {
        Self {
            kind: CommandKind::Move,
            target: CommandTarget::Position(position),
        }
    }

    pub fn attack(target: UnitId) -> Self {
        Self {
            kind: CommandKind::Attack,
            target: CommandTarget::Unit(target),
        }
    }

    pub fn attack_building(target: BuildingId) -> Self {
        Self {
            kind: CommandKind::Attack,
            target: CommandTarget::Building(target),
        }
    }

    pub fn gather(zone: ZoneId) -> Self {
        Self {
            kind: CommandKind::Gather,
            target: CommandTarget::Zone(zone),
        }
    }

    pub fn patrol(point: Vec2) -> Self {
        Self {
            kind: CommandKind::Patrol,
            target: CommandTarget::Position(point),
        }
    }

    pub fn guard(target: UnitId) -> Self {
        Self {
            kind: CommandKind::Guard,
            target: CommandTarget::Unit(target),
        }
    }

    pub fn guard_building(target: BuildingId) -> Self {
        Self {
            kind: CommandKind::Guard,
            target: CommandTarget::Building(target),
        }
    }

    /// Does the target type make sense for the kind?
    pub fn is_well_formed(&self) -> bool {
        matches!(
            (self.kind, self.target),
            (CommandKind::Move, CommandTarget::Position(_))
                | (CommandKind::Patrol, CommandTarget::Position(_))
                | (CommandKind::Attack, CommandTarget::Unit(_))
                | (CommandKind::Attack, CommandTarget::Building(_))
                | (CommandKind::Gather, CommandTarget::Zone(_))
                | (CommandKind::Guard, CommandTarget::Unit(_))
                | (CommandKind::Guard, CommandTarget::Building(_))
        )
    }
}

/// A command bound to one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitCommand {
    pub id: CommandId,
    pub unit: UnitId,
    pub order: Order,
    pub priority: CommandPriority,
    pub created_ms: TimeMs,
    pub issuer: CommandIssuer,
}

impl UnitCommand {
    pub fn new(
        unit: UnitId,
        order: Order,
        priority: CommandPriority,
        issuer: CommandIssuer,
        created_ms: TimeMs,
    ) -> Self {
        Self {
            id: CommandId::new(),
            unit,
            order,
            priority,
            created_ms,
            issuer,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.order.kind
    }

    pub fn target(&self) -> CommandTarget {
        self.order.target
    }

    pub fn age(&self, now_ms: TimeMs) -> TimeMs {
        now_ms.saturating_sub(self.created_ms)
    }

    /// Unit targeted by an attack, if any
    pub fn attack_target(&self) -> Option<UnitId> {
        match (self.order.kind, self.order.target) {
            (CommandKind::Attack, CommandTarget::Unit(id)) => Some(id),
            _ => None,
        }
    }
}
