//! Resource zone ownership: placement, worker assignment, extraction, queries
//!
//! Queries are linear scans. Maps carry tens of zones, so no spatial index.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::ZoneConfig;
use crate::core::types::{FactionId, TimeMs, UnitId, Vec2, ZoneId};
use crate::resource::zone::{ResourceCategory, ResourceZone};
use crate::terrain::grid::TerrainGrid;
use crate::world::Building;

/// Result of one zone's extraction during a tick
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub zone: ZoneId,
    pub category: ResourceCategory,
    pub amount: f32,
    /// Workers that were assigned when the amount was extracted
    pub workers: Vec<UnitId>,
}

/// Owns every resource zone on the map
#[derive(Debug, Clone, Default)]
pub struct ResourceZoneAllocator {
    zones: Vec<ResourceZone>,
    /// Units per worker per second
    extraction_rate: f32,
}

impl ResourceZoneAllocator {
    pub fn new(extraction_rate: f32) -> Self {
        Self {
            zones: Vec::new(),
            extraction_rate,
        }
    }

    /// Build an allocator around hand-placed zones, renumbering their ids
    pub fn from_zones(zones: Vec<ResourceZone>, extraction_rate: f32) -> Self {
        let zones = zones
            .into_iter()
            .enumerate()
            .map(|(i, mut z)| {
                z.id = ZoneId(i as u32);
                z
            })
            .collect();
        Self {
            zones,
            extraction_rate,
        }
    }

    /// Place `zones_per_category` zones of every category by rejection sampling.
    ///
    /// Candidates must sit on passable tiles, keep `min_edge_distance` from
    /// the map edge and `min_separation` from every other zone. A zone that
    /// finds no spot within the attempt budget is skipped.
    pub fn place(grid: &mut TerrainGrid, config: &ZoneConfig, rng: &mut ChaCha8Rng) -> Self {
        let mut allocator = Self::new(config.extraction_rate);
        let margin = config.min_edge_distance;
        let max_x = grid.width() as f32 - 1.0 - margin;
        let max_y = grid.height() as f32 - 1.0 - margin;

        if max_x <= margin || max_y <= margin {
            tracing::warn!("map too small for resource zones with edge margin {}", margin);
            return allocator;
        }

        for category in ResourceCategory::ALL {
            for _ in 0..config.zones_per_category {
                let spot = (0..config.max_placement_attempts).find_map(|_| {
                    let candidate = Vec2::new(
                        rng.gen_range(margin..=max_x).round(),
                        rng.gen_range(margin..=max_y).round(),
                    );
                    let clear = grid.tile_at(candidate).is_some_and(|t| t.passable)
                        && allocator
                            .zones
                            .iter()
                            .all(|z| z.center.distance(&candidate) >= config.min_separation);
                    clear.then_some(candidate)
                });

                let Some(center) = spot else {
                    tracing::warn!(
                        "no spot for {:?} zone after {} attempts",
                        category,
                        config.max_placement_attempts
                    );
                    continue;
                };

                let id = ZoneId(allocator.zones.len() as u32);
                grid.link_zone(id, center, config.radius);
                allocator.zones.push(ResourceZone::new(
                    id,
                    category,
                    center,
                    config.radius,
                    config.amount,
                    config.max_workers,
                ));
            }
        }

        tracing::debug!("placed {} resource zones", allocator.zones.len());
        allocator
    }

    pub fn zone(&self, id: ZoneId) -> Option<&ResourceZone> {
        self.zones.get(id.0 as usize)
    }

    pub fn zones(&self) -> &[ResourceZone] {
        &self.zones
    }

    pub fn extraction_rate(&self) -> f32 {
        self.extraction_rate
    }

    /// Assign a worker to a zone; false when the zone is missing, exhausted or full
    pub fn assign(&mut self, zone: ZoneId, worker: UnitId) -> bool {
        let Some(z) = self.zones.get_mut(zone.0 as usize) else {
            return false;
        };
        let assigned = z.assign(worker);
        if assigned {
            tracing::trace!("worker {:?} gathering at zone {:?}", worker, zone);
        }
        assigned
    }

    /// Remove a worker from whichever zone holds it
    pub fn release(&mut self, worker: UnitId) {
        for zone in &mut self.zones {
            zone.release(worker);
        }
    }

    /// Drop workers that fail `keep` (dead units)
    pub fn retain_workers(&mut self, mut keep: impl FnMut(UnitId) -> bool) {
        for zone in &mut self.zones {
            zone.workers.retain(|w| keep(*w));
        }
    }

    /// Zone the worker is assigned to, if any
    pub fn zone_of(&self, worker: UnitId) -> Option<ZoneId> {
        self.zones.iter().find(|z| z.has_worker(worker)).map(|z| z.id)
    }

    /// Run one tick of extraction on every zone
    pub fn extract(&mut self, delta_ms: TimeMs) -> Vec<Extraction> {
        let dt_secs = delta_ms as f32 / 1000.0;
        let rate = self.extraction_rate;
        let mut results = Vec::new();

        for zone in &mut self.zones {
            if zone.workers.is_empty() || zone.exhausted {
                continue;
            }
            let workers = zone.workers.clone();
            let amount = zone.extract(rate, dt_secs);
            if zone.exhausted {
                tracing::debug!("zone {:?} ({:?}) exhausted", zone.id, zone.category);
            }
            if amount > 0.0 {
                results.push(Extraction {
                    zone: zone.id,
                    category: zone.category,
                    amount,
                    workers,
                });
            }
        }

        results
    }

    /// Nearest zone to `position`, optionally filtered by category, skipping
    /// exhausted zones and (when `require_capacity`) full ones
    pub fn nearest_zone(
        &self,
        position: Vec2,
        category: Option<ResourceCategory>,
        require_capacity: bool,
    ) -> Option<&ResourceZone> {
        self.zones
            .iter()
            .filter(|z| !z.exhausted)
            .filter(|z| category.map_or(true, |c| z.category == c))
            .filter(|z| !require_capacity || z.has_capacity())
            .min_by(|a, b| {
                a.center
                    .distance_squared(&position)
                    .total_cmp(&b.center.distance_squared(&position))
            })
    }

    /// Zone whose area contains `position`
    pub fn zone_at(&self, position: Vec2) -> Option<&ResourceZone> {
        self.zones.iter().find(|z| z.contains(position))
    }
}

/// Nearest constructed drop-off building belonging to `faction`
pub fn nearest_drop_off<'a>(
    buildings: &'a [Building],
    faction: FactionId,
    position: Vec2,
) -> Option<&'a Building> {
    buildings
        .iter()
        .filter(|b| b.faction == faction && b.constructed && b.kind.stats().drop_off)
        .min_by(|a, b| {
            a.position
                .distance_squared(&position)
                .total_cmp(&b.position.distance_squared(&position))
        })
}
