//! The opponent AI core for one match
//!
//! `AiCore` owns every piece of AI state (terrain, zones, commands, groups,
//! threat tables, planners) and exchanges only a [`WorldView`] in and
//! [`WorldMutation`]s out with the world-state collaborator.

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, trace, warn};

use crate::command::{
    CommandContext, CommandIssuer, CommandKind, CommandPriority, Commit, Order, ProposalBuffer, ProposalSource,
    UnitCommand, UnitCommandController,
};
use crate::core::config::AiConfig;
use crate::core::error::Result;
use crate::core::types::{BuildingId, CommandId, FactionId, GroupId, TimeMs, UnitId, Vec2, ZoneId};
use crate::resource::{ResourceCategory, ResourceZoneAllocator};
use crate::strategy::{StrategicAI, StrategicContext};
use crate::tactics::{CombatGroup, CombatGroupManager, GroupRole, ThreatAssessment, ThreatEntry};
use crate::terrain::TerrainGrid;
use crate::world::{WorldIndex, WorldMutation, WorldView};

#[derive(Debug)]
pub struct AiCore {
    config: AiConfig,
    grid: TerrainGrid,
    zones: ResourceZoneAllocator,
    controller: UnitCommandController,
    groups: CombatGroupManager,
    threats: AHashMap<FactionId, ThreatAssessment>,
    planners: AHashMap<FactionId, StrategicAI>,
    proposals: ProposalBuffer,
    now_ms: TimeMs,
}

impl AiCore {
    /// Generate terrain and resource zones from the config's seed.
    /// `spawns` are kept clear of impassable terrain.
    pub fn new(config: AiConfig, spawns: &[Vec2]) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.terrain.seed);
        let mut grid = TerrainGrid::generate(&config.terrain, spawns, &mut rng);
        let zones = ResourceZoneAllocator::place(&mut grid, &config.zones, &mut rng);
        info!(
            width = grid.width(),
            height = grid.height(),
            zones = zones.zones().len(),
            seed = config.terrain.seed,
            "map generated"
        );
        Ok(Self::with_terrain(config, grid, zones))
    }

    /// Build around an existing grid and zone set
    pub fn with_terrain(config: AiConfig, grid: TerrainGrid, zones: ResourceZoneAllocator) -> Self {
        Self {
            controller: UnitCommandController::new(config.commands.clone(), config.path.clone()),
            groups: CombatGroupManager::new(config.groups.clone()),
            config,
            grid,
            zones,
            threats: AHashMap::new(),
            planners: AHashMap::new(),
            proposals: ProposalBuffer::new(),
            now_ms: 0,
        }
    }

    /// Register a planner for an AI-controlled faction
    pub fn add_faction(&mut self, faction: FactionId) -> bool {
        if self.planners.contains_key(&faction) {
            return false;
        }
        self.planners
            .insert(faction, StrategicAI::new(faction, self.config.strategy.clone()));
        info!(?faction, posture = ?self.config.strategy.posture, "AI faction registered");
        true
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn zones(&self) -> &ResourceZoneAllocator {
        &self.zones
    }

    pub fn controller(&self) -> &UnitCommandController {
        &self.controller
    }

    pub fn now_ms(&self) -> TimeMs {
        self.now_ms
    }

    pub fn planner(&self, faction: FactionId) -> Option<&StrategicAI> {
        self.planners.get(&faction)
    }

    /// Registered AI factions in id order
    pub fn ai_factions(&self) -> Vec<FactionId> {
        let mut factions: Vec<FactionId> = self.planners.keys().copied().collect();
        factions.sort();
        factions
    }

    /// Advance the core by one tick.
    ///
    /// Order: clock, threat refresh, dead-worker release, group proposals,
    /// reactive proposals, resolution, command execution, extraction.
    pub fn update(&mut self, view: &WorldView<'_>, delta_ms: TimeMs) -> Result<Vec<WorldMutation>> {
        if let Err(err) = view.validate() {
            warn!(%err, "rejected world snapshot");
            return Err(err);
        }
        self.now_ms += delta_ms;
        let now = self.now_ms;
        let index = view.index();

        for faction in view.factions() {
            self.threats
                .entry(faction)
                .or_insert_with(|| ThreatAssessment::new(faction, &self.config.threat));
        }
        for threats in self.threats.values_mut() {
            threats.refresh(view, now);
        }

        self.zones.retain_workers(|w| index.is_alive(w));

        self.groups
            .update(&index, self.grid.center(), &mut self.proposals);
        self.propose_reactive(&index);
        let issued = self.commit_proposals();

        let mut ctx = CommandContext {
            index: &index,
            grid: &self.grid,
            zones: &mut self.zones,
            threats: &self.threats,
            now_ms: now,
            delta_ms,
        };
        let outcome = self.controller.process(&mut ctx);
        let mut mutations = outcome.mutations;

        for (attacker, target) in self.controller.attack_targets() {
            let Some(unit) = index.unit(attacker) else {
                continue;
            };
            if let Some(threats) = self.threats.get_mut(&unit.faction) {
                threats.mark_engaged(target);
            }
        }

        mutations.extend(self.deposits(&index, delta_ms));
        trace!(
            now,
            issued,
            ended = outcome.ended.len(),
            paths = outcome.path_requests,
            mutations = mutations.len(),
            "tick"
        );
        Ok(mutations)
    }

    /// Idle fighters attack the nearest threat inside their range plus a buffer
    fn propose_reactive(&mut self, index: &WorldIndex<'_>) {
        let buffer = self.config.threat.reactive_buffer;
        for unit in index.view.units {
            if !unit.can_fight() || self.controller.has_command(unit.id) || self.proposals.contains(unit.id) {
                continue;
            }
            let Some(threats) = self.threats.get(&unit.faction) else {
                continue;
            };
            let nearest = threats.nearest_within(unit.position, unit.attack_range + buffer, self.now_ms, |e| {
                index.is_alive(e.unit)
            });
            if let Some(entry) = nearest {
                self.proposals.propose(
                    unit.id,
                    Order::attack(entry.unit),
                    CommandPriority::Normal,
                    ProposalSource::Reactive,
                );
            }
        }
    }

    /// Resolve pending proposals and commit the winners
    fn commit_proposals(&mut self) -> usize {
        let mut issued = 0;
        for proposal in self.proposals.resolve() {
            if let Commit::Issued { replaced } = self.controller.commit(&proposal, self.now_ms) {
                self.release_replaced(proposal.unit, replaced.as_ref());
                issued += 1;
            }
        }
        issued
    }

    fn release_replaced(&mut self, unit: UnitId, replaced: Option<&UnitCommand>) {
        if replaced.is_some_and(|c| c.kind() == CommandKind::Gather) {
            self.zones.release(unit);
        }
    }

    /// Split each zone's extraction between its workers' factions
    fn deposits(&mut self, index: &WorldIndex<'_>, delta_ms: TimeMs) -> Vec<WorldMutation> {
        let mut credit: Vec<(FactionId, ResourceCategory, f32)> = Vec::new();
        for extraction in self.zones.extract(delta_ms) {
            let share = extraction.amount / extraction.workers.len().max(1) as f32;
            for worker in &extraction.workers {
                let Some(unit) = index.unit(*worker) else {
                    continue;
                };
                match credit
                    .iter_mut()
                    .find(|(f, c, _)| *f == unit.faction && *c == extraction.category)
                {
                    Some((_, _, amount)) => *amount += share,
                    None => credit.push((unit.faction, extraction.category, share)),
                }
            }
        }
        credit
            .into_iter()
            .map(|(faction, category, amount)| WorldMutation::Deposit {
                faction,
                category,
                amount,
            })
            .collect()
    }

    // -- direct commands --

    /// Issue any order immediately, replacing the unit's current command
    pub fn issue(&mut self, unit: UnitId, order: Order, priority: CommandPriority) -> CommandId {
        let command = UnitCommand::new(unit, order, priority, CommandIssuer::External, self.now_ms);
        let id = command.id;
        let replaced = self.controller.issue(command);
        self.release_replaced(unit, replaced.as_ref());
        id
    }

    pub fn issue_move(&mut self, unit: UnitId, position: Vec2, priority: CommandPriority) -> CommandId {
        self.issue(unit, Order::move_to(position), priority)
    }

    pub fn issue_attack(&mut self, unit: UnitId, target: UnitId, priority: CommandPriority) -> CommandId {
        self.issue(unit, Order::attack(target), priority)
    }

    pub fn issue_attack_building(&mut self, unit: UnitId, target: BuildingId, priority: CommandPriority) -> CommandId {
        self.issue(unit, Order::attack_building(target), priority)
    }

    pub fn issue_gather(&mut self, unit: UnitId, zone: ZoneId, priority: CommandPriority) -> CommandId {
        self.issue(unit, Order::gather(zone), priority)
    }

    pub fn active_command(&self, unit: UnitId) -> Option<&UnitCommand> {
        self.controller.active_command(unit)
    }

    /// Form a group owned by the first live unit's faction
    pub fn create_combat_group(
        &mut self,
        view: &WorldView<'_>,
        units: &[UnitId],
        role: GroupRole,
        target: Option<Vec2>,
    ) -> Option<GroupId> {
        let index = view.index();
        let faction = units.iter().find_map(|id| index.unit(*id))?.faction;
        self.groups.create_group(faction, units, role, target, &index)
    }

    // -- diagnostics --

    /// Fresh threat entries seen by `faction`, highest score first
    pub fn threat_map(&self, faction: FactionId) -> Vec<ThreatEntry> {
        self.threats
            .get(&faction)
            .map(|t| t.threat_map(self.now_ms))
            .unwrap_or_default()
    }

    pub fn threats(&self, faction: FactionId) -> Option<&ThreatAssessment> {
        self.threats.get(&faction)
    }

    pub fn combat_groups(&self) -> Vec<&CombatGroup> {
        self.groups.groups()
    }

    pub fn combat_group(&self, id: GroupId) -> Option<&CombatGroup> {
        self.groups.group(id)
    }

    // -- planning --

    /// Run `faction`'s planner if its decision interval has elapsed.
    /// Commands it proposes are committed immediately; production and
    /// construction requests are returned.
    pub fn run_strategic_decision(&mut self, faction: FactionId, view: &WorldView<'_>) -> Vec<WorldMutation> {
        let Some(planner) = self.planners.get_mut(&faction) else {
            return Vec::new();
        };
        let index = view.index();
        let mut proposals = ProposalBuffer::new();
        let mut ctx = StrategicContext {
            index: &index,
            grid: &self.grid,
            zones: &self.zones,
            threats: self.threats.get(&faction),
            controller: &self.controller,
            groups: &mut self.groups,
            proposals: &mut proposals,
            now_ms: self.now_ms,
        };
        let mutations = planner.decide(&mut ctx);

        for proposal in proposals.resolve() {
            if let Commit::Issued { replaced } = self.controller.commit(&proposal, self.now_ms) {
                self.release_replaced(proposal.unit, replaced.as_ref());
            }
        }
        mutations
    }

    /// Run every registered planner in faction order
    pub fn run_strategic_decisions(&mut self, view: &WorldView<'_>) -> Vec<WorldMutation> {
        let mut mutations = Vec::new();
        for faction in self.ai_factions() {
            mutations.extend(self.run_strategic_decision(faction, view));
        }
        mutations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceZone;
    use crate::world::{BuildingKind, UnitKind, World};

    fn open_core(zones: Vec<ResourceZone>) -> AiCore {
        AiCore::with_terrain(
            AiConfig::default(),
            TerrainGrid::open(48, 48),
            ResourceZoneAllocator::from_zones(zones, AiConfig::default().zones.extraction_rate),
        )
    }

    #[test]
    fn test_generated_core_is_deterministic() {
        let spawns = [Vec2::new(12.0, 12.0), Vec2::new(80.0, 80.0)];
        let a = AiCore::new(AiConfig::default(), &spawns).unwrap();
        let b = AiCore::new(AiConfig::default(), &spawns).unwrap();
        let centers = |core: &AiCore| core.zones().zones().iter().map(|z| z.center).collect::<Vec<_>>();
        assert_eq!(centers(&a), centers(&b));
        assert!(a.grid().is_passable(crate::terrain::TileCoord::new(12, 12)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AiConfig::default();
        config.zones.max_workers = 0;
        assert!(AiCore::new(config, &[]).is_err());
    }

    #[test]
    fn test_non_finite_snapshot_rejected() {
        let mut world = World::new();
        let unit = world.spawn_unit(FactionId(0), UnitKind::Infantry, Vec2::new(1.0, 1.0));
        world.unit_mut(unit).unwrap().position = Vec2::new(f32::NAN, 1.0);
        let snapshot = world.snapshot();

        let mut core = open_core(Vec::new());
        assert!(core.update(&snapshot.view(), 100).is_err());
        assert_eq!(core.now_ms(), 0);
    }

    #[test]
    fn test_idle_unit_reacts_to_nearby_enemy() {
        let mut world = World::new();
        let defender = world.spawn_unit(FactionId(0), UnitKind::Infantry, Vec2::new(10.0, 10.0));
        let enemy = world.spawn_unit(FactionId(1), UnitKind::Engineer, Vec2::new(12.5, 10.0));
        let snapshot = world.snapshot();

        let mut core = open_core(Vec::new());
        core.update(&snapshot.view(), 100).unwrap();

        assert_eq!(core.active_command(defender).unwrap().order, Order::attack(enemy));
        assert!(core.threat_map(FactionId(0))[0].engaged);
    }

    #[test]
    fn test_extraction_deposits_to_worker_faction() {
        let zone = ResourceZone::new(ZoneId(0), ResourceCategory::Oil, Vec2::new(10.0, 10.0), 3.0, 1_000.0, 4);
        let mut core = open_core(vec![zone]);
        let mut world = World::new();
        let worker = world.spawn_unit(FactionId(2), UnitKind::Engineer, Vec2::new(10.0, 10.0));

        core.issue_gather(worker, ZoneId(0), CommandPriority::Normal);
        let snapshot = world.snapshot();
        // First tick registers the worker, extraction runs in the same tick
        let mutations = core.update(&snapshot.view(), 1_000).unwrap();

        let deposit = mutations.iter().find_map(|m| match m {
            WorldMutation::Deposit { faction, category, amount } => Some((*faction, *category, *amount)),
            _ => None,
        });
        assert_eq!(deposit, Some((FactionId(2), ResourceCategory::Oil, 2.0)));
    }

    #[test]
    fn test_replacing_gather_releases_worker() {
        let zone = ResourceZone::new(ZoneId(0), ResourceCategory::Steel, Vec2::new(10.0, 10.0), 3.0, 1_000.0, 4);
        let mut core = open_core(vec![zone]);
        let mut world = World::new();
        let worker = world.spawn_unit(FactionId(0), UnitKind::Engineer, Vec2::new(10.0, 10.0));

        core.issue_gather(worker, ZoneId(0), CommandPriority::Normal);
        let snapshot = world.snapshot();
        core.update(&snapshot.view(), 100).unwrap();
        assert_eq!(core.zones().zone_of(worker), Some(ZoneId(0)));

        core.issue_move(worker, Vec2::new(20.0, 20.0), CommandPriority::High);
        assert_eq!(core.zones().zone_of(worker), None);
    }

    #[test]
    fn test_create_combat_group_uses_unit_faction() {
        let mut world = World::new();
        let a = world.spawn_unit(FactionId(3), UnitKind::Tank, Vec2::new(5.0, 5.0));
        let b = world.spawn_unit(FactionId(3), UnitKind::Tank, Vec2::new(6.0, 5.0));
        let snapshot = world.snapshot();

        let mut core = open_core(Vec::new());
        let id = core
            .create_combat_group(&snapshot.view(), &[a, b], GroupRole::Raid, None)
            .unwrap();
        assert_eq!(core.combat_group(id).unwrap().faction, FactionId(3));
        assert!(core.create_combat_group(&snapshot.view(), &[], GroupRole::Raid, None).is_none());
    }

    #[test]
    fn test_strategic_decision_requires_registration() {
        let mut world = World::new();
        world.spawn_building(FactionId(0), BuildingKind::Headquarters, Vec2::new(10.0, 10.0), true);
        world.set_stockpile(FactionId(0), crate::world::Stockpile::new(500.0, 500.0));
        let snapshot = world.snapshot();

        let mut core = open_core(Vec::new());
        assert!(core.run_strategic_decision(FactionId(0), &snapshot.view()).is_empty());
        assert!(core.add_faction(FactionId(0)));
        assert!(!core.add_faction(FactionId(0)));
        assert!(!core.run_strategic_decision(FactionId(0), &snapshot.view()).is_empty());
    }
}
