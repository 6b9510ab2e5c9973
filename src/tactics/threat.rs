//! Per-faction record of visible enemies

use ahash::AHashMap;
use serde::Serialize;

use crate::core::config::ThreatConfig;
use crate::core::types::{FactionId, TimeMs, UnitId, Vec2};
use crate::world::{UnitKind, WorldView};

/// `base weight of the kind * health fraction`
pub fn threat_score(kind: UnitKind, health_fraction: f32) -> f32 {
    kind.stats().threat_weight * health_fraction.clamp(0.0, 1.0)
}

/// Last known state of one enemy unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatEntry {
    pub unit: UnitId,
    pub faction: FactionId,
    pub position: Vec2,
    pub kind: UnitKind,
    pub score: f32,
    pub last_seen_ms: TimeMs,
    /// Some unit of the observing faction is attacking it
    pub engaged: bool,
}

/// Threats as seen by one faction
#[derive(Debug, Clone)]
pub struct ThreatAssessment {
    observer: FactionId,
    ttl_ms: TimeMs,
    entries: AHashMap<UnitId, ThreatEntry>,
}

impl ThreatAssessment {
    pub fn new(observer: FactionId, config: &ThreatConfig) -> Self {
        Self {
            observer,
            ttl_ms: config.ttl_ms,
            entries: AHashMap::new(),
        }
    }

    pub fn observer(&self) -> FactionId {
        self.observer
    }

    /// Overwrite entries for every visible enemy, then drop stale ones
    pub fn refresh(&mut self, view: &WorldView<'_>, now_ms: TimeMs) {
        for unit in view.hostile_units(self.observer) {
            self.entries.insert(
                unit.id,
                ThreatEntry {
                    unit: unit.id,
                    faction: unit.faction,
                    position: unit.position,
                    kind: unit.kind,
                    score: threat_score(unit.kind, unit.health_fraction()),
                    last_seen_ms: now_ms,
                    engaged: false,
                },
            );
        }
        self.prune(now_ms);
    }

    pub fn prune(&mut self, now_ms: TimeMs) {
        let ttl = self.ttl_ms;
        self.entries
            .retain(|_, e| now_ms.saturating_sub(e.last_seen_ms) <= ttl);
    }

    fn is_fresh(&self, entry: &ThreatEntry, now_ms: TimeMs) -> bool {
        now_ms.saturating_sub(entry.last_seen_ms) <= self.ttl_ms
    }

    pub fn mark_engaged(&mut self, unit: UnitId) {
        if let Some(entry) = self.entries.get_mut(&unit) {
            entry.engaged = true;
        }
    }

    pub fn get(&self, unit: UnitId) -> Option<&ThreatEntry> {
        self.entries.get(&unit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh entries, highest score first
    pub fn threat_map(&self, now_ms: TimeMs) -> Vec<ThreatEntry> {
        let mut entries: Vec<ThreatEntry> = self
            .entries
            .values()
            .filter(|e| self.is_fresh(e, now_ms))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.unit.cmp(&b.unit))
        });
        entries
    }

    /// Nearest fresh entry within `radius` of `position` that passes `accept`
    pub fn nearest_within(
        &self,
        position: Vec2,
        radius: f32,
        now_ms: TimeMs,
        mut accept: impl FnMut(&ThreatEntry) -> bool,
    ) -> Option<&ThreatEntry> {
        self.entries
            .values()
            .filter(|e| self.is_fresh(e, now_ms))
            .filter(|e| e.position.distance(&position) <= radius)
            .filter(|e| accept(e))
            .min_by(|a, b| {
                a.position
                    .distance_squared(&position)
                    .total_cmp(&b.position.distance_squared(&position))
                    .then_with(|| a.unit.cmp(&b.unit))
            })
    }

    /// Sum of scores weighted by proximity to `base`.
    ///
    /// An entry at the base counts fully; at distance `falloff` it counts half.
    pub fn threat_level(&self, base: Vec2, falloff: f32, now_ms: TimeMs) -> f32 {
        let falloff = falloff.max(f32::EPSILON);
        self.entries
            .values()
            .filter(|e| self.is_fresh(e, now_ms))
            .map(|e| e.score * falloff / (falloff + e.position.distance(&base)))
            .sum()
    }

    /// Fresh entries within `radius` of `position`
    pub fn within(&self, position: Vec2, radius: f32, now_ms: TimeMs) -> impl Iterator<Item = &ThreatEntry> + '_ {
        self.entries
            .values()
            .filter(move |e| self.is_fresh(e, now_ms) && e.position.distance(&position) <= radius)
    }
}
