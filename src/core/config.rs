//! Opponent AI configuration with documented constants
//!
//! All tunable numbers are collected here. Every section deserializes with
//! `#[serde(default)]`, so a TOML file only needs the values it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{CoreError, Result};
use crate::core::types::TimeMs;
use crate::strategy::{AggressionPosture, ResourcePriority};

/// Largest terrain the grid will allocate
pub const MAX_TERRAIN_TILES: u64 = 2048 * 2048;

/// Terrain generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: u32,
    pub height: u32,
    /// Seed for noise phases and zone placement
    pub seed: u64,
    /// Radius around each spawn point forced to open terrain
    pub spawn_clear_radius: f32,
    /// Noise above this becomes impassable mountain
    pub mountain_threshold: f32,
    /// Noise above this (and below mountain) becomes slow forest
    pub forest_threshold: f32,
    /// Noise below this becomes water, unless close to the map center
    pub water_threshold: f32,
    /// Water is never placed within this fraction of the half-extent from center
    pub water_center_clearance: f32,
    /// Chance that an otherwise open tile becomes fast road
    pub road_chance: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 96,
            height: 96,
            seed: 7,
            spawn_clear_radius: 8.0,
            mountain_threshold: 0.62,
            forest_threshold: 0.38,
            water_threshold: -0.55,
            water_center_clearance: 0.3,
            road_chance: 0.03,
        }
    }
}

/// Resource zone placement and extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub zones_per_category: u32,
    pub radius: f32,
    /// Starting amount of every zone
    pub amount: f32,
    /// Units extracted per worker per second
    pub extraction_rate: f32,
    /// Worker cap per zone
    pub max_workers: usize,
    pub min_edge_distance: f32,
    /// Minimum center-to-center distance between any two zones
    pub min_separation: f32,
    /// Rejection-sampling attempts per zone before giving up on it
    pub max_placement_attempts: u32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            zones_per_category: 4,
            radius: 3.0,
            amount: 2500.0,
            extraction_rate: 2.0,
            max_workers: 4,
            min_edge_distance: 6.0,
            min_separation: 12.0,
            max_placement_attempts: 200,
        }
    }
}

/// Pathfinding budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// A* gives up (and returns the direct fallback) after expanding this many nodes
    pub max_search_nodes: usize,
    /// At most this many A* searches run per tick; the rest wait a tick
    pub max_requests_per_tick: usize,
    /// A unit within this distance of a tile occupies it
    pub unit_tolerance: f32,
    /// A cached path is replaced when its goal drifts further than this
    pub repath_distance: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_search_nodes: 4096,
            max_requests_per_tick: 8,
            unit_tolerance: 0.45,
            repath_distance: 2.0,
        }
    }
}

/// Command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Hard lifetime of any command
    pub timeout_ms: TimeMs,
    /// Distance at which a move goal or waypoint counts as reached
    pub arrive_epsilon: f32,
    /// A guard moves back when further than this from the guarded entity
    pub guard_leash: f32,
    /// A guard engages threats within this radius of the guarded entity
    pub guard_scan_radius: f32,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            arrive_epsilon: 0.25,
            guard_leash: 3.0,
            guard_scan_radius: 10.0,
        }
    }
}

/// Threat tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatConfig {
    /// Entries not refreshed for this long are pruned
    pub ttl_ms: TimeMs,
    /// Idle units react to threats within attack range plus this buffer
    pub reactive_buffer: f32,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 30_000,
            reactive_buffer: 2.0,
        }
    }
}

/// Combat group behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub max_group_size: usize,
    /// Enemies this close to a defend anchor are engaged
    pub defend_engage_radius: f32,
    /// Defenders further than this from their slot move back into formation
    pub defend_slot_tolerance: f32,
    /// An enemy with fewer than `raid_isolation_allies` allies within this radius is isolated
    pub raid_isolation_radius: f32,
    pub raid_isolation_allies: usize,
    pub scout_radius: f32,
    /// Distance between neighboring formation slots
    pub formation_spacing: f32,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            max_group_size: 24,
            defend_engage_radius: 12.0,
            defend_slot_tolerance: 1.0,
            raid_isolation_radius: 6.0,
            raid_isolation_allies: 2,
            scout_radius: 8.0,
            formation_spacing: 2.0,
        }
    }
}

/// Strategic planner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub decision_interval_ms: TimeMs,
    pub posture: AggressionPosture,
    pub resource_priority: ResourcePriority,

    // Phase thresholds (units AND buildings must both be reached)
    pub mid_phase_units: usize,
    pub mid_phase_buildings: usize,
    pub late_phase_units: usize,
    pub late_phase_buildings: usize,

    // Economy
    /// Total stockpile required before the building queue is consulted
    pub build_gate: f32,
    pub build_cooldown_ms: TimeMs,
    pub expansion_threshold: f32,
    pub expansion_min_buildings: usize,
    pub max_expansions: usize,
    /// Max queued items per production building
    pub max_queue_per_building: usize,

    // Military
    pub attack_cooldown_ms: TimeMs,
    pub attack_min_army: usize,
    /// Share of the standing army committed to a large-scale attack
    pub attack_fraction: f32,
    /// Enemies inside this radius of the main base trigger reactive defense
    pub base_defense_radius: f32,
    pub perimeter_radius: f32,
    pub perimeter_posts: usize,
    /// Aggregated threat above this shifts production to heavy units
    pub high_threat_level: f32,
    /// Minimum idle combat units to form a defend group
    pub min_defend_group: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            decision_interval_ms: 2_500,
            posture: AggressionPosture::Balanced,
            resource_priority: ResourcePriority::Balanced,
            mid_phase_units: 12,
            mid_phase_buildings: 4,
            late_phase_units: 30,
            late_phase_buildings: 8,
            build_gate: 300.0,
            build_cooldown_ms: 10_000,
            expansion_threshold: 2_000.0,
            expansion_min_buildings: 6,
            max_expansions: 2,
            max_queue_per_building: 3,
            attack_cooldown_ms: 30_000,
            attack_min_army: 8,
            attack_fraction: 0.7,
            base_defense_radius: 20.0,
            perimeter_radius: 10.0,
            perimeter_posts: 4,
            high_threat_level: 40.0,
            min_defend_group: 3,
        }
    }
}

/// Complete configuration for one `AiCore`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub terrain: TerrainConfig,
    pub zones: ZoneConfig,
    pub path: PathConfig,
    pub commands: CommandConfig,
    pub threat: ThreatConfig,
    pub groups: GroupConfig,
    pub strategy: StrategyConfig,
}

impl AiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text and validate
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AiConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let t = &self.terrain;
        if t.width < 8 || t.height < 8 {
            return Err(invalid(format!(
                "terrain must be at least 8x8, got {}x{}",
                t.width, t.height
            )));
        }
        if u64::from(t.width) * u64::from(t.height) > MAX_TERRAIN_TILES {
            return Err(invalid(format!(
                "terrain {}x{} exceeds {} tiles",
                t.width, t.height, MAX_TERRAIN_TILES
            )));
        }
        if t.forest_threshold >= t.mountain_threshold {
            return Err(invalid(format!(
                "forest_threshold ({}) must be < mountain_threshold ({})",
                t.forest_threshold, t.mountain_threshold
            )));
        }

        let z = &self.zones;
        if z.max_workers == 0 {
            return Err(invalid("zones.max_workers must be positive".into()));
        }
        if z.extraction_rate <= 0.0 || z.amount <= 0.0 {
            return Err(invalid("zone amount and extraction rate must be positive".into()));
        }

        if self.path.max_requests_per_tick == 0 || self.path.max_search_nodes == 0 {
            return Err(invalid("path budgets must be positive".into()));
        }

        if self.commands.timeout_ms == 0 {
            return Err(invalid("commands.timeout_ms must be positive".into()));
        }

        let s = &self.strategy;
        if s.mid_phase_units > s.late_phase_units || s.mid_phase_buildings > s.late_phase_buildings {
            return Err(invalid("mid phase thresholds must not exceed late phase thresholds".into()));
        }
        if !(0.0..=1.0).contains(&s.attack_fraction) {
            return Err(invalid(format!(
                "attack_fraction ({}) must be within 0..=1",
                s.attack_fraction
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> CoreError {
    CoreError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AiConfig::from_toml_str(
            r#"
            [terrain]
            width = 64
            seed = 99

            [strategy]
            posture = "aggressive"
            "#,
        )
        .unwrap();

        assert_eq!(config.terrain.width, 64);
        assert_eq!(config.terrain.height, TerrainConfig::default().height);
        assert_eq!(config.strategy.posture, AggressionPosture::Aggressive);
        assert_eq!(config.commands.timeout_ms, 60_000);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = AiConfig::default();
        config.terrain.forest_threshold = 0.9;
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_terrain_rejected() {
        let mut config = AiConfig::default();
        config.terrain.width = 70_000;
        config.terrain.height = 70_000;
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));

        config.terrain.width = 2048;
        config.terrain.height = 2048;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(matches!(
            AiConfig::from_toml_str("terrain = 3"),
            Err(CoreError::Toml(_))
        ));
    }
}
