//! Resource zones for gatherable resources (oil, steel)
//!
//! A zone depletes as workers extract from it and becomes permanently
//! exhausted at zero, evicting its workers.

use serde::{Deserialize, Serialize};

use crate::core::types::{UnitId, Vec2, ZoneId};

/// Remaining amounts below this are treated as empty
pub const EXHAUSTION_EPSILON: f32 = 1e-3;

/// Type of resource available in a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Oil,
    Steel,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 2] = [ResourceCategory::Oil, ResourceCategory::Steel];
}

/// A zone where workers gather one resource category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceZone {
    pub id: ZoneId,
    pub category: ResourceCategory,
    pub center: Vec2,
    pub radius: f32,
    pub total: f32,
    pub remaining: f32,
    pub workers: Vec<UnitId>,
    pub max_workers: usize,
    pub exhausted: bool,
}

impl ResourceZone {
    pub fn new(
        id: ZoneId,
        category: ResourceCategory,
        center: Vec2,
        radius: f32,
        amount: f32,
        max_workers: usize,
    ) -> Self {
        Self {
            id,
            category,
            center,
            radius,
            total: amount,
            remaining: amount.max(0.0),
            workers: Vec::new(),
            max_workers,
            exhausted: amount <= 0.0,
        }
    }

    /// Check if a position is within this zone
    pub fn contains(&self, pos: Vec2) -> bool {
        self.center.distance(&pos) <= self.radius
    }

    pub fn has_capacity(&self) -> bool {
        !self.exhausted && self.workers.len() < self.max_workers
    }

    pub fn has_worker(&self, worker: UnitId) -> bool {
        self.workers.contains(&worker)
    }

    /// Add a worker. Re-adding an assigned worker succeeds without change;
    /// an exhausted or full zone refuses.
    pub fn assign(&mut self, worker: UnitId) -> bool {
        if self.has_worker(worker) {
            return true;
        }
        if !self.has_capacity() {
            return false;
        }
        self.workers.push(worker);
        true
    }

    pub fn release(&mut self, worker: UnitId) -> bool {
        let before = self.workers.len();
        self.workers.retain(|w| *w != worker);
        self.workers.len() != before
    }

    /// Extract for `dt_secs`, returns amount actually gathered
    pub fn extract(&mut self, rate_per_worker: f32, dt_secs: f32) -> f32 {
        if self.exhausted || self.workers.is_empty() {
            return 0.0;
        }

        let requested = rate_per_worker * self.workers.len() as f32 * dt_secs;
        let mut gathered = requested.min(self.remaining).max(0.0);
        self.remaining -= gathered;

        if self.remaining <= EXHAUSTION_EPSILON {
            gathered += self.remaining.max(0.0);
            self.remaining = 0.0;
            self.exhausted = true;
            self.workers.clear();
        }
        gathered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn zone(amount: f32) -> ResourceZone {
        ResourceZone::new(ZoneId(0), ResourceCategory::Oil, Vec2::new(0.0, 0.0), 5.0, amount, 3)
    }

    #[test]
    fn test_resource_zone_contains_boundary() {
        let zone = zone(100.0);
        assert!(zone.contains(Vec2::new(5.0, 0.0)));
        assert!(!zone.contains(Vec2::new(5.1, 0.0)));
    }

    #[test]
    fn test_assign_is_idempotent_and_capped() {
        let mut ids: SlotMap<UnitId, ()> = SlotMap::with_key();
        let workers: Vec<UnitId> = (0..4).map(|_| ids.insert(())).collect();
        let mut zone = zone(100.0);

        assert!(zone.assign(workers[0]));
        assert!(zone.assign(workers[0]));
        assert_eq!(zone.workers.len(), 1);

        assert!(zone.assign(workers[1]));
        assert!(zone.assign(workers[2]));
        assert!(!zone.assign(workers[3]));
        assert_eq!(zone.workers.len(), 3);
    }

    #[test]
    fn test_depletion_exhausts_and_evicts() {
        let mut ids: SlotMap<UnitId, ()> = SlotMap::with_key();
        let mut zone = zone(100.0);
        zone.assign(ids.insert(()));

        // 100 ticks of 100ms at 10/s with one worker
        let mut gathered = 0.0;
        for _ in 0..100 {
            gathered += zone.extract(10.0, 0.1);
            assert!(zone.remaining >= 0.0);
        }

        assert_eq!(zone.remaining, 0.0);
        assert!(zone.exhausted);
        assert!(zone.workers.is_empty());
        assert!((gathered - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_exhausted_zone_refuses_workers() {
        let mut ids: SlotMap<UnitId, ()> = SlotMap::with_key();
        let mut zone = zone(1.0);
        zone.assign(ids.insert(()));
        zone.extract(10.0, 1.0);
        assert!(zone.exhausted);
        assert!(!zone.assign(ids.insert(())));
    }
}
