//! Unit and building kinds with their static data
//!
//! Every kind resolves its stats once, at definition time. Call sites never
//! branch on kind names to look up costs or training buildings.

use serde::{Deserialize, Serialize};

use crate::core::types::TimeMs;
use crate::resource::ResourceCategory;

/// Resource amounts held by (or owed by) a faction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stockpile {
    pub oil: f32,
    pub steel: f32,
}

impl Stockpile {
    pub const fn new(oil: f32, steel: f32) -> Self {
        Self { oil, steel }
    }

    pub fn get(&self, category: ResourceCategory) -> f32 {
        match category {
            ResourceCategory::Oil => self.oil,
            ResourceCategory::Steel => self.steel,
        }
    }

    pub fn add(&mut self, category: ResourceCategory, amount: f32) {
        match category {
            ResourceCategory::Oil => self.oil += amount,
            ResourceCategory::Steel => self.steel += amount,
        }
    }

    pub fn total(&self) -> f32 {
        self.oil + self.steel
    }

    /// Can this stockpile pay `cost` in full?
    pub fn covers(&self, cost: &Stockpile) -> bool {
        self.oil >= cost.oil && self.steel >= cost.steel
    }

    pub fn saturating_sub(&self, cost: &Stockpile) -> Stockpile {
        Stockpile {
            oil: (self.oil - cost.oil).max(0.0),
            steel: (self.steel - cost.steel).max(0.0),
        }
    }
}

/// Static data for a unit kind
#[derive(Debug, Clone)]
pub struct UnitStats {
    pub max_health: f32,
    pub damage: f32,
    pub attack_range: f32,
    /// Tiles per second
    pub speed: f32,
    pub attack_cooldown_ms: TimeMs,
    /// Base weight for threat scoring
    pub threat_weight: f32,
    pub cost: Stockpile,
    pub build_time_ms: TimeMs,
    pub trained_at: BuildingKind,
}

/// Type of unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Engineer,        // Worker, gathers and builds
    Infantry,        // Cheap baseline
    Scout,           // Light fast vehicle
    Gunship,         // Aircraft
    Tank,            // Armored
    Artillery,       // Heavy ranged
    MissileLauncher, // Long range missile battery
}

const ENGINEER: UnitStats = UnitStats {
    max_health: 60.0,
    damage: 0.0,
    attack_range: 0.0,
    speed: 2.5,
    attack_cooldown_ms: 1_000,
    threat_weight: 1.0,
    cost: Stockpile::new(50.0, 0.0),
    build_time_ms: 4_000,
    trained_at: BuildingKind::Headquarters,
};

const INFANTRY: UnitStats = UnitStats {
    max_health: 100.0,
    damage: 10.0,
    attack_range: 1.5,
    speed: 2.0,
    attack_cooldown_ms: 1_000,
    threat_weight: 3.0,
    cost: Stockpile::new(20.0, 50.0),
    build_time_ms: 4_000,
    trained_at: BuildingKind::Barracks,
};

const SCOUT: UnitStats = UnitStats {
    max_health: 80.0,
    damage: 6.0,
    attack_range: 3.0,
    speed: 4.0,
    attack_cooldown_ms: 800,
    threat_weight: 5.0,
    cost: Stockpile::new(60.0, 40.0),
    build_time_ms: 5_000,
    trained_at: BuildingKind::Factory,
};

const GUNSHIP: UnitStats = UnitStats {
    max_health: 140.0,
    damage: 18.0,
    attack_range: 4.0,
    speed: 4.5,
    attack_cooldown_ms: 1_200,
    threat_weight: 6.0,
    cost: Stockpile::new(150.0, 100.0),
    build_time_ms: 8_000,
    trained_at: BuildingKind::Airfield,
};

const TANK: UnitStats = UnitStats {
    max_health: 300.0,
    damage: 30.0,
    attack_range: 3.5,
    speed: 1.8,
    attack_cooldown_ms: 1_500,
    threat_weight: 8.0,
    cost: Stockpile::new(120.0, 200.0),
    build_time_ms: 9_000,
    trained_at: BuildingKind::Factory,
};

const ARTILLERY: UnitStats = UnitStats {
    max_health: 120.0,
    damage: 45.0,
    attack_range: 8.0,
    speed: 1.2,
    attack_cooldown_ms: 2_500,
    threat_weight: 10.0,
    cost: Stockpile::new(150.0, 150.0),
    build_time_ms: 10_000,
    trained_at: BuildingKind::Factory,
};

const MISSILE_LAUNCHER: UnitStats = UnitStats {
    max_health: 150.0,
    damage: 60.0,
    attack_range: 10.0,
    speed: 1.4,
    attack_cooldown_ms: 3_000,
    threat_weight: 12.0,
    cost: Stockpile::new(250.0, 150.0),
    build_time_ms: 12_000,
    trained_at: BuildingKind::Factory,
};

impl UnitKind {
    pub const ALL: [UnitKind; 7] = [
        UnitKind::Engineer,
        UnitKind::Infantry,
        UnitKind::Scout,
        UnitKind::Gunship,
        UnitKind::Tank,
        UnitKind::Artillery,
        UnitKind::MissileLauncher,
    ];

    pub fn stats(&self) -> &'static UnitStats {
        match self {
            UnitKind::Engineer => &ENGINEER,
            UnitKind::Infantry => &INFANTRY,
            UnitKind::Scout => &SCOUT,
            UnitKind::Gunship => &GUNSHIP,
            UnitKind::Tank => &TANK,
            UnitKind::Artillery => &ARTILLERY,
            UnitKind::MissileLauncher => &MISSILE_LAUNCHER,
        }
    }

    pub fn is_worker(&self) -> bool {
        matches!(self, UnitKind::Engineer)
    }

    pub fn is_combat(&self) -> bool {
        self.stats().damage > 0.0
    }
}

/// Static data for a building kind
#[derive(Debug, Clone)]
pub struct BuildingStats {
    pub cost: Stockpile,
    pub max_health: f32,
    /// Pathfinding exclusion radius around the building's position
    pub footprint_radius: f32,
    pub build_time_ms: TimeMs,
    /// Workers may return resources here
    pub drop_off: bool,
}

/// Type of building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    Headquarters,
    Barracks,
    Factory,
    Airfield,
    Refinery,
    Turret,
}

const HEADQUARTERS: BuildingStats = BuildingStats {
    cost: Stockpile::new(400.0, 400.0),
    max_health: 2_000.0,
    footprint_radius: 2.0,
    build_time_ms: 30_000,
    drop_off: true,
};

const BARRACKS: BuildingStats = BuildingStats {
    cost: Stockpile::new(100.0, 150.0),
    max_health: 800.0,
    footprint_radius: 1.5,
    build_time_ms: 15_000,
    drop_off: false,
};

const FACTORY: BuildingStats = BuildingStats {
    cost: Stockpile::new(200.0, 300.0),
    max_health: 1_200.0,
    footprint_radius: 2.0,
    build_time_ms: 20_000,
    drop_off: false,
};

const AIRFIELD: BuildingStats = BuildingStats {
    cost: Stockpile::new(300.0, 200.0),
    max_health: 1_000.0,
    footprint_radius: 2.0,
    build_time_ms: 20_000,
    drop_off: false,
};

const REFINERY: BuildingStats = BuildingStats {
    cost: Stockpile::new(150.0, 100.0),
    max_health: 700.0,
    footprint_radius: 1.5,
    build_time_ms: 12_000,
    drop_off: true,
};

const TURRET: BuildingStats = BuildingStats {
    cost: Stockpile::new(50.0, 150.0),
    max_health: 600.0,
    footprint_radius: 1.0,
    build_time_ms: 8_000,
    drop_off: false,
};

impl BuildingKind {
    pub fn stats(&self) -> &'static BuildingStats {
        match self {
            BuildingKind::Headquarters => &HEADQUARTERS,
            BuildingKind::Barracks => &BARRACKS,
            BuildingKind::Factory => &FACTORY,
            BuildingKind::Airfield => &AIRFIELD,
            BuildingKind::Refinery => &REFINERY,
            BuildingKind::Turret => &TURRET,
        }
    }

    /// Can this building train `kind`?
    pub fn trains(&self, kind: UnitKind) -> bool {
        kind.stats().trained_at == *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threat_weight_ordering() {
        let w = |k: UnitKind| k.stats().threat_weight;
        assert!(w(UnitKind::MissileLauncher) > w(UnitKind::Artillery));
        assert!(w(UnitKind::Artillery) > w(UnitKind::Tank));
        assert!(w(UnitKind::Tank) > w(UnitKind::Gunship));
        assert!(w(UnitKind::Gunship) > w(UnitKind::Infantry));
        assert!(w(UnitKind::Infantry) > w(UnitKind::Engineer));
    }

    #[test]
    fn test_training_buildings() {
        assert!(BuildingKind::Headquarters.trains(UnitKind::Engineer));
        assert!(BuildingKind::Factory.trains(UnitKind::Tank));
        assert!(!BuildingKind::Barracks.trains(UnitKind::Tank));
    }

    #[test]
    fn test_stockpile_covers() {
        let bank = Stockpile::new(100.0, 50.0);
        assert!(bank.covers(&Stockpile::new(100.0, 50.0)));
        assert!(!bank.covers(&Stockpile::new(10.0, 60.0)));
        assert_eq!(
            bank.saturating_sub(&Stockpile::new(150.0, 10.0)),
            Stockpile::new(0.0, 40.0)
        );
    }

    #[test]
    fn test_engineer_is_only_non_combat_kind() {
        let non_combat: Vec<_> = UnitKind::ALL.iter().filter(|k| !k.is_combat()).collect();
        assert_eq!(non_combat, vec![&UnitKind::Engineer]);
    }
}
