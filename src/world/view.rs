//! One tick's read-only input

use ahash::AHashMap;

use crate::core::error::{CoreError, Result};
use crate::core::types::{BuildingId, FactionId, UnitId, Vec2};
use crate::world::entity::{Building, Unit};
use crate::world::kinds::{BuildingKind, Stockpile};

/// Snapshot of the world handed to the core for one tick
#[derive(Debug, Clone, Copy)]
pub struct WorldView<'a> {
    pub units: &'a [Unit],
    pub buildings: &'a [Building],
    pub stockpiles: &'a AHashMap<FactionId, Stockpile>,
}

impl<'a> WorldView<'a> {
    pub fn new(
        units: &'a [Unit],
        buildings: &'a [Building],
        stockpiles: &'a AHashMap<FactionId, Stockpile>,
    ) -> Self {
        Self {
            units,
            buildings,
            stockpiles,
        }
    }

    /// Reject snapshots the core cannot reason about (non-finite numbers)
    pub fn validate(&self) -> Result<()> {
        for unit in self.units {
            if !unit.position.is_finite() || !unit.health.is_finite() || !unit.speed.is_finite() {
                return Err(CoreError::InvalidSnapshot(format!(
                    "unit {:?} has non-finite state at {:?}",
                    unit.id, unit.position
                )));
            }
        }
        for building in self.buildings {
            if !building.position.is_finite() || !building.health.is_finite() {
                return Err(CoreError::InvalidSnapshot(format!(
                    "building {:?} has non-finite state at {:?}",
                    building.id, building.position
                )));
            }
        }
        Ok(())
    }

    pub fn stockpile(&self, faction: FactionId) -> Stockpile {
        self.stockpiles.get(&faction).copied().unwrap_or_default()
    }

    pub fn units_of(&self, faction: FactionId) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units.iter().filter(move |u| u.faction == faction)
    }

    /// Units of every other faction (visibility filtering is the collaborator's job)
    pub fn hostile_units(&self, faction: FactionId) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units.iter().filter(move |u| u.faction != faction && u.is_alive())
    }

    pub fn buildings_of(&self, faction: FactionId) -> impl Iterator<Item = &'a Building> + 'a {
        self.buildings.iter().filter(move |b| b.faction == faction)
    }

    pub fn hostile_buildings(&self, faction: FactionId) -> impl Iterator<Item = &'a Building> + 'a {
        self.buildings.iter().filter(move |b| b.faction != faction)
    }

    /// Every faction with at least one unit or building
    pub fn factions(&self) -> Vec<FactionId> {
        let mut factions: Vec<FactionId> = self
            .units
            .iter()
            .map(|u| u.faction)
            .chain(self.buildings.iter().map(|b| b.faction))
            .collect();
        factions.sort();
        factions.dedup();
        factions
    }

    /// The faction's primary base: first constructed headquarters, else building centroid
    pub fn main_base(&self, faction: FactionId) -> Option<Vec2> {
        self.buildings_of(faction)
            .find(|b| b.constructed && b.kind == BuildingKind::Headquarters)
            .map(|b| b.position)
            .or_else(|| Vec2::centroid(self.buildings_of(faction).map(|b| b.position)))
    }

    pub fn index(&self) -> WorldIndex<'a> {
        WorldIndex::build(*self)
    }
}

/// Id lookups over a view, built once per tick
#[derive(Debug)]
pub struct WorldIndex<'a> {
    pub view: WorldView<'a>,
    units: AHashMap<UnitId, &'a Unit>,
    buildings: AHashMap<BuildingId, &'a Building>,
}

impl<'a> WorldIndex<'a> {
    pub fn build(view: WorldView<'a>) -> Self {
        let units = view
            .units
            .iter()
            .filter(|u| u.is_alive())
            .map(|u| (u.id, u))
            .collect();
        let buildings = view.buildings.iter().map(|b| (b.id, b)).collect();
        Self {
            view,
            units,
            buildings,
        }
    }

    /// Live unit by id; stale ids resolve to None
    pub fn unit(&self, id: UnitId) -> Option<&'a Unit> {
        self.units.get(&id).copied()
    }

    pub fn building(&self, id: BuildingId) -> Option<&'a Building> {
        self.buildings.get(&id).copied()
    }

    pub fn is_alive(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::kinds::UnitKind;
    use crate::world::World;

    #[test]
    fn test_validate_rejects_nan_position() {
        let mut world = World::new();
        let id = world.spawn_unit(FactionId(0), UnitKind::Infantry, Vec2::new(1.0, 1.0));
        let mut snapshot = world.snapshot();
        snapshot
            .units
            .iter_mut()
            .filter(|u| u.id == id)
            .for_each(|u| u.position.x = f32::NAN);

        assert!(matches!(
            snapshot.view().validate(),
            Err(CoreError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_main_base_prefers_headquarters() {
        let mut world = World::new();
        world.spawn_building(FactionId(0), BuildingKind::Barracks, Vec2::new(20.0, 20.0), true);
        world.spawn_building(FactionId(0), BuildingKind::Headquarters, Vec2::new(5.0, 5.0), true);
        let snapshot = world.snapshot();

        assert_eq!(snapshot.view().main_base(FactionId(0)), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(snapshot.view().main_base(FactionId(1)), None);
    }

    #[test]
    fn test_stale_id_does_not_resolve() {
        let mut world = World::new();
        let id = world.spawn_unit(FactionId(0), UnitKind::Infantry, Vec2::new(1.0, 1.0));
        world.remove_unit(id);
        let replacement = world.spawn_unit(FactionId(0), UnitKind::Infantry, Vec2::new(1.0, 1.0));
        assert_ne!(id, replacement);

        let snapshot = world.snapshot();
        let index = snapshot.view().index();
        assert!(index.unit(id).is_none());
        assert!(index.unit(replacement).is_some());
    }
}
