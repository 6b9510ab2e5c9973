//! Reference world-state collaborator
//!
//! Owns units and buildings in generation-checked arenas and applies the
//! core's mutations. Balance and production bookkeeping is deliberately
//! plain: charge on request, count down, spawn.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::core::types::{BuildingId, FactionId, TimeMs, UnitId, Vec2};
use crate::terrain::{TerrainGrid, TileCoord};
use crate::world::entity::{Building, ProductionItem, Unit};
use crate::world::kinds::{BuildingKind, Stockpile, UnitKind};
use crate::world::mutation::WorldMutation;
use crate::world::view::WorldView;

/// Directions tried around a building before a unit spawns on it
const SPAWN_DIRECTIONS: usize = 8;

/// Owned copy of the world handed to the core each tick
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    pub units: Vec<Unit>,
    pub buildings: Vec<Building>,
    pub stockpiles: AHashMap<FactionId, Stockpile>,
}

impl WorldSnapshot {
    pub fn view(&self) -> WorldView<'_> {
        WorldView::new(&self.units, &self.buildings, &self.stockpiles)
    }
}

/// Outcome of applying one batch of mutations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub applied: usize,
    /// Requests dropped because the target no longer exists or the cost could not be paid
    pub rejected: usize,
    pub units_killed: usize,
    pub buildings_destroyed: usize,
}

/// The game world: every unit, building and faction balance
#[derive(Debug, Default)]
pub struct World {
    pub time_ms: TimeMs,
    units: SlotMap<UnitId, Unit>,
    buildings: SlotMap<BuildingId, Building>,
    stockpiles: AHashMap<FactionId, Stockpile>,
    terrain: Option<TerrainGrid>,
    spawn_counter: u32,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep finished units on passable, in-bounds ground
    pub fn set_terrain(&mut self, terrain: TerrainGrid) {
        self.terrain = Some(terrain);
    }

    pub fn spawn_unit(&mut self, faction: FactionId, kind: UnitKind, position: Vec2) -> UnitId {
        self.units
            .insert_with_key(|id| Unit::new(id, faction, kind, position))
    }

    pub fn spawn_building(
        &mut self,
        faction: FactionId,
        kind: BuildingKind,
        position: Vec2,
        constructed: bool,
    ) -> BuildingId {
        self.buildings.insert_with_key(|id| {
            if constructed {
                Building::constructed(id, faction, kind, position)
            } else {
                Building::new(id, faction, kind, position)
            }
        })
    }

    pub fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(id)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(id)
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn unit_count(&self, faction: FactionId) -> usize {
        self.units.values().filter(|u| u.faction == faction).count()
    }

    pub fn building_count(&self, faction: FactionId) -> usize {
        self.buildings.values().filter(|b| b.faction == faction).count()
    }

    pub fn stockpile(&self, faction: FactionId) -> Stockpile {
        self.stockpiles.get(&faction).copied().unwrap_or_default()
    }

    pub fn set_stockpile(&mut self, faction: FactionId, stockpile: Stockpile) {
        self.stockpiles.insert(faction, stockpile);
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            units: self.units.values().cloned().collect(),
            buildings: self.buildings.values().cloned().collect(),
            stockpiles: self.stockpiles.clone(),
        }
    }

    /// Apply a batch of mutations in order
    pub fn apply(&mut self, mutations: &[WorldMutation]) -> ApplyReport {
        let mut report = ApplyReport::default();

        for mutation in mutations {
            let applied = match mutation {
                WorldMutation::MoveUnit { unit, position } => match self.units.get_mut(*unit) {
                    Some(u) => {
                        u.position = *position;
                        true
                    }
                    None => false,
                },
                WorldMutation::DamageUnit { unit, amount } => {
                    let killed = match self.units.get_mut(*unit) {
                        Some(u) => {
                            u.health -= amount;
                            Some(u.health <= 0.0)
                        }
                        None => None,
                    };
                    if killed == Some(true) {
                        self.units.remove(*unit);
                        report.units_killed += 1;
                    }
                    killed.is_some()
                }
                WorldMutation::DamageBuilding { building, amount } => {
                    let destroyed = match self.buildings.get_mut(*building) {
                        Some(b) => {
                            b.health -= amount;
                            Some(b.health <= 0.0)
                        }
                        None => None,
                    };
                    if destroyed == Some(true) {
                        self.buildings.remove(*building);
                        report.buildings_destroyed += 1;
                    }
                    destroyed.is_some()
                }
                WorldMutation::SetTask { unit, task, target } => match self.units.get_mut(*unit) {
                    Some(u) => {
                        u.task = *task;
                        u.target = *target;
                        true
                    }
                    None => false,
                },
                WorldMutation::QueueProduction { building, kind } => {
                    self.queue_production(*building, *kind)
                }
                WorldMutation::PlaceBuilding {
                    faction,
                    kind,
                    position,
                } => self.place_building(*faction, *kind, *position),
                WorldMutation::Deposit {
                    faction,
                    category,
                    amount,
                } => {
                    self.stockpiles.entry(*faction).or_default().add(*category, *amount);
                    true
                }
            };

            if applied {
                report.applied += 1;
            } else {
                report.rejected += 1;
            }
        }

        report
    }

    fn queue_production(&mut self, building: BuildingId, kind: UnitKind) -> bool {
        let Some(b) = self.buildings.get_mut(building) else {
            return false;
        };
        if !b.constructed || !b.kind.trains(kind) {
            return false;
        }
        let stats = kind.stats();
        let bank = self.stockpiles.entry(b.faction).or_default();
        if !bank.covers(&stats.cost) {
            return false;
        }
        *bank = bank.saturating_sub(&stats.cost);
        b.production_queue.push(ProductionItem {
            kind,
            remaining_ms: stats.build_time_ms,
        });
        true
    }

    fn place_building(&mut self, faction: FactionId, kind: BuildingKind, position: Vec2) -> bool {
        let cost = kind.stats().cost;
        let bank = self.stockpiles.entry(faction).or_default();
        if !bank.covers(&cost) {
            return false;
        }
        *bank = bank.saturating_sub(&cost);
        self.spawn_building(faction, kind, position, false);
        true
    }

    /// Advance construction and production; returns newly spawned units
    pub fn advance(&mut self, delta_ms: TimeMs) -> Vec<UnitId> {
        self.time_ms += delta_ms;
        let mut finished: Vec<(FactionId, UnitKind, Vec2, f32)> = Vec::new();

        for building in self.buildings.values_mut() {
            let stats = building.kind.stats();
            if !building.constructed {
                building.progress += delta_ms as f32 / stats.build_time_ms.max(1) as f32;
                if building.progress >= 1.0 {
                    building.progress = 1.0;
                    building.constructed = true;
                    tracing::debug!("{:?} completed for faction {:?}", building.kind, building.faction);
                }
                continue;
            }

            if let Some(front) = building.production_queue.first_mut() {
                front.remaining_ms = front.remaining_ms.saturating_sub(delta_ms);
                if front.remaining_ms == 0 {
                    let item = building.production_queue.remove(0);
                    finished.push((building.faction, item.kind, building.position, stats.footprint_radius));
                }
            }
        }

        let mut spawned = Vec::with_capacity(finished.len());
        for (faction, kind, origin, footprint) in finished {
            let angle = self.spawn_counter as f32 * 1.1;
            self.spawn_counter = self.spawn_counter.wrapping_add(1);
            let position = self.spawn_point(origin, footprint + 1.5, angle);
            spawned.push(self.spawn_unit(faction, kind, position));
        }
        spawned
    }

    /// Point `distance` from `origin`, starting at `angle` and turning until
    /// it lands on passable ground
    fn spawn_point(&self, origin: Vec2, distance: f32, angle: f32) -> Vec2 {
        let at = |a: f32| origin + Vec2::new(a.cos() * distance, a.sin() * distance);
        let Some(terrain) = &self.terrain else {
            return at(angle);
        };
        (0..SPAWN_DIRECTIONS)
            .map(|i| at(angle + std::f32::consts::TAU * i as f32 / SPAWN_DIRECTIONS as f32))
            .find(|p| terrain.is_passable(TileCoord::from_position(*p)))
            .unwrap_or_else(|| terrain.clamp(origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceCategory;
    use crate::terrain::TerrainCategory;

    #[test]
    fn test_damage_kills_and_removes_unit() {
        let mut world = World::new();
        let id = world.spawn_unit(FactionId(0), UnitKind::Engineer, Vec2::new(0.0, 0.0));

        let report = world.apply(&[WorldMutation::DamageUnit { unit: id, amount: 1_000.0 }]);
        assert_eq!(report.units_killed, 1);
        assert!(world.unit(id).is_none());

        // Second hit on a stale id is rejected, not applied to a reused slot
        let report = world.apply(&[WorldMutation::DamageUnit { unit: id, amount: 1.0 }]);
        assert_eq!(report.rejected, 1);
    }

    #[test]
    fn test_production_charges_cost_and_spawns() {
        let mut world = World::new();
        let faction = FactionId(0);
        let hq = world.spawn_building(faction, BuildingKind::Headquarters, Vec2::new(10.0, 10.0), true);
        world.set_stockpile(faction, Stockpile::new(60.0, 0.0));

        let report = world.apply(&[
            WorldMutation::QueueProduction { building: hq, kind: UnitKind::Engineer },
            WorldMutation::QueueProduction { building: hq, kind: UnitKind::Engineer },
        ]);
        assert_eq!(report.applied, 1);
        assert_eq!(report.rejected, 1);
        assert!((world.stockpile(faction).oil - 10.0).abs() < 1e-4);

        let spawned = world.advance(UnitKind::Engineer.stats().build_time_ms);
        assert_eq!(spawned.len(), 1);
        assert_eq!(world.unit_count(faction), 1);
    }

    #[test]
    fn test_units_spawn_on_dry_land() {
        let mut world = World::new();
        world.set_terrain(TerrainGrid::from_fn(20, 20, |c| {
            if c.x > 11 {
                TerrainCategory::Water
            } else {
                TerrainCategory::Open
            }
        }));
        let faction = FactionId(0);
        let hq = world.spawn_building(faction, BuildingKind::Headquarters, Vec2::new(10.0, 10.0), true);
        world.set_stockpile(faction, Stockpile::new(1_000.0, 0.0));

        for _ in 0..6 {
            world.apply(&[WorldMutation::QueueProduction { building: hq, kind: UnitKind::Engineer }]);
            world.advance(UnitKind::Engineer.stats().build_time_ms);
        }

        assert_eq!(world.unit_count(faction), 6);
        let grid = world.terrain.clone().unwrap();
        for unit in world.units() {
            assert!(grid.is_passable(TileCoord::from_position(unit.position)), "{:?}", unit.position);
        }
    }

    #[test]
    fn test_units_spawn_inside_map_corner() {
        let mut world = World::new();
        world.set_terrain(TerrainGrid::open(8, 8));
        let faction = FactionId(0);
        let hq = world.spawn_building(faction, BuildingKind::Headquarters, Vec2::new(7.0, 7.0), true);
        world.set_stockpile(faction, Stockpile::new(100.0, 0.0));

        world.apply(&[WorldMutation::QueueProduction { building: hq, kind: UnitKind::Engineer }]);
        let spawned = world.advance(UnitKind::Engineer.stats().build_time_ms);

        let unit = world.unit(spawned[0]).unwrap();
        assert!(TerrainGrid::open(8, 8).in_bounds(TileCoord::from_position(unit.position)));
    }

    #[test]
    fn test_unaffordable_building_not_placed() {
        let mut world = World::new();
        let faction = FactionId(1);
        let report = world.apply(&[WorldMutation::PlaceBuilding {
            faction,
            kind: BuildingKind::Factory,
            position: Vec2::new(5.0, 5.0),
        }]);
        assert_eq!(report.rejected, 1);
        assert_eq!(world.building_count(faction), 0);
    }

    #[test]
    fn test_construction_completes() {
        let mut world = World::new();
        let faction = FactionId(0);
        world.set_stockpile(faction, Stockpile::new(1_000.0, 1_000.0));
        world.apply(&[WorldMutation::PlaceBuilding {
            faction,
            kind: BuildingKind::Turret,
            position: Vec2::new(5.0, 5.0),
        }]);
        assert!(world.buildings().all(|b| !b.constructed));

        world.advance(BuildingKind::Turret.stats().build_time_ms);
        assert!(world.buildings().all(|b| b.constructed));
    }

    #[test]
    fn test_deposit_credits_category() {
        let mut world = World::new();
        world.apply(&[WorldMutation::Deposit {
            faction: FactionId(0),
            category: ResourceCategory::Steel,
            amount: 12.5,
        }]);
        assert_eq!(world.stockpile(FactionId(0)), Stockpile::new(0.0, 12.5));
    }
}
