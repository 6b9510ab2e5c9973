//! Strategic planner for one AI faction
//!
//! Runs on its own throttled cadence. Each decision reads the tick's world
//! view, updates the faction's [`StrategicState`], proposes commands, forms
//! combat groups and returns production and construction requests.

use ahash::AHashMap;
use tracing::{debug, info};

use crate::command::{CommandKind, CommandPriority, CommandTarget, Order, ProposalBuffer, ProposalSource, UnitCommandController};
use crate::core::config::StrategyConfig;
use crate::core::types::{BuildingId, FactionId, GroupId, TimeMs, UnitId, Vec2, ZoneId};
use crate::resource::{nearest_drop_off, ResourceCategory, ResourceZoneAllocator};
use crate::strategy::phase::Phase;
use crate::strategy::plans::{preferred_mix, Objective, StrategicState};
use crate::strategy::posture::AggressionPosture;
use crate::tactics::{CombatGroupManager, GroupRole, ThreatAssessment};
use crate::terrain::{TerrainGrid, TileCoord};
use crate::world::{Building, BuildingKind, Stockpile, Unit, UnitKind, WorldIndex, WorldMutation, WorldView};

/// Added to the farthest building distance for the controlled-area hint
const CONTROL_MARGIN: f32 = 6.0;
/// Units queued per decision at most
const MAX_PRODUCTION_PER_DECISION: usize = 4;
/// Ring search limit for building sites, in tiles
const SITE_SEARCH_RADIUS: i32 = 24;
/// Free space kept between building footprints
const SITE_GAP: f32 = 1.0;
/// A zone with an own drop-off closer than this is already covered
const EXPANSION_REACH: f32 = 12.0;
/// Scout targets stay this far inside the map edge
const SCOUT_INSET: f32 = 10.0;

/// Borrowed state for one decision
pub struct StrategicContext<'w, 'a> {
    pub index: &'w WorldIndex<'a>,
    pub grid: &'w TerrainGrid,
    pub zones: &'w ResourceZoneAllocator,
    pub threats: Option<&'w ThreatAssessment>,
    pub controller: &'w UnitCommandController,
    pub groups: &'w mut CombatGroupManager,
    pub proposals: &'w mut ProposalBuffer,
    pub now_ms: TimeMs,
}

enum Production {
    Queued,
    Unaffordable,
    NoTrainer,
    /// Every trainer's queue is full
    Busy,
}

/// Spending and requests accumulated during one decision
struct Budget {
    faction: FactionId,
    bank: Stockpile,
    queued: AHashMap<BuildingId, usize>,
    placed: Vec<(BuildingKind, Vec2)>,
    mutations: Vec<WorldMutation>,
}

impl Budget {
    fn new(faction: FactionId, bank: Stockpile) -> Self {
        Self {
            faction,
            bank,
            queued: AHashMap::new(),
            placed: Vec::new(),
            mutations: Vec::new(),
        }
    }

    /// Queue `kind` at the least loaded building able to train it
    fn queue_unit(&mut self, kind: UnitKind, buildings: &[&Building], max_queue: usize) -> Production {
        let mut seen_trainer = false;
        let mut best: Option<(BuildingId, usize)> = None;
        for building in buildings {
            if !building.constructed || !building.kind.trains(kind) {
                continue;
            }
            seen_trainer = true;
            let load = building.production_queue.len() + self.queued.get(&building.id).copied().unwrap_or(0);
            if load >= max_queue {
                continue;
            }
            if best.map_or(true, |(_, l)| load < l) {
                best = Some((building.id, load));
            }
        }

        let Some((building, _)) = best else {
            return if seen_trainer {
                Production::Busy
            } else {
                Production::NoTrainer
            };
        };
        let cost = &kind.stats().cost;
        if !self.bank.covers(cost) {
            return Production::Unaffordable;
        }
        self.bank = self.bank.saturating_sub(cost);
        *self.queued.entry(building).or_default() += 1;
        self.mutations.push(WorldMutation::QueueProduction { building, kind });
        Production::Queued
    }

    fn place(&mut self, kind: BuildingKind, position: Vec2) -> bool {
        let cost = &kind.stats().cost;
        if !self.bank.covers(cost) {
            return false;
        }
        self.bank = self.bank.saturating_sub(cost);
        self.placed.push((kind, position));
        self.mutations.push(WorldMutation::PlaceBuilding {
            faction: self.faction,
            kind,
            position,
        });
        true
    }
}

/// Building counts the planner aims for in each phase
fn desired_buildings(phase: Phase, perimeter_posts: usize) -> Vec<(BuildingKind, usize)> {
    match phase {
        Phase::Early => vec![(BuildingKind::Barracks, 1), (BuildingKind::Refinery, 1)],
        Phase::Mid => vec![
            (BuildingKind::Barracks, 2),
            (BuildingKind::Factory, 1),
            (BuildingKind::Refinery, 2),
            (BuildingKind::Turret, perimeter_posts),
        ],
        Phase::Late => vec![
            (BuildingKind::Barracks, 2),
            (BuildingKind::Factory, 2),
            (BuildingKind::Airfield, 1),
            (BuildingKind::Refinery, 3),
            (BuildingKind::Turret, perimeter_posts),
        ],
    }
}

/// Evenly spaced posts on a circle around the base
fn perimeter_posts(base: Vec2, radius: f32, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            base + Vec2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

#[derive(Debug)]
pub struct StrategicAI {
    faction: FactionId,
    config: StrategyConfig,
    state: StrategicState,
    last_decision_ms: Option<TimeMs>,
    defend_group: Option<GroupId>,
    scout_group: Option<GroupId>,
    attack_group: Option<GroupId>,
}

impl StrategicAI {
    pub fn new(faction: FactionId, config: StrategyConfig) -> Self {
        let state = StrategicState::new(config.resource_priority, config.attack_min_army);
        Self {
            faction,
            config,
            state,
            last_decision_ms: None,
            defend_group: None,
            scout_group: None,
            attack_group: None,
        }
    }

    pub fn faction(&self) -> FactionId {
        self.faction
    }

    pub fn state(&self) -> &StrategicState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn posture(&self) -> AggressionPosture {
        self.config.posture
    }

    pub fn last_decision_ms(&self) -> Option<TimeMs> {
        self.last_decision_ms
    }

    /// Is a decision due at `now_ms`?
    pub fn should_decide(&self, now_ms: TimeMs) -> bool {
        match self.last_decision_ms {
            None => true,
            Some(last) => now_ms >= last + self.config.decision_interval_ms,
        }
    }

    /// Run one decision if the interval has elapsed; returns the production
    /// and construction requests it made
    pub fn decide(&mut self, ctx: &mut StrategicContext<'_, '_>) -> Vec<WorldMutation> {
        if !self.should_decide(ctx.now_ms) {
            return Vec::new();
        }
        self.last_decision_ms = Some(ctx.now_ms);

        let view = ctx.index.view;
        let units: Vec<&Unit> = view.units_of(self.faction).filter(|u| u.is_alive()).collect();
        let buildings: Vec<&Building> = view.buildings_of(self.faction).collect();
        let Some(base) = view
            .main_base(self.faction)
            .or_else(|| Vec2::centroid(units.iter().map(|u| u.position)))
        else {
            debug!(faction = ?self.faction, "nothing left to plan for");
            return Vec::new();
        };

        self.update_phase(units.len(), buildings.len());
        self.forget_lost_groups(ctx.groups);

        self.state.threat_level = ctx
            .threats
            .map_or(0.0, |t| t.threat_level(base, self.config.base_defense_radius, ctx.now_ms));
        self.state.controlled_radius = buildings
            .iter()
            .map(|b| b.position.distance(&base))
            .fold(0.0, f32::max)
            + CONTROL_MARGIN;
        if self.state.perimeter.is_empty() && self.config.perimeter_posts > 0 {
            self.state.perimeter = perimeter_posts(base, self.config.perimeter_radius, self.config.perimeter_posts);
            debug!(faction = ?self.faction, posts = self.state.perimeter.len(), "perimeter laid out");
        }

        let mut budget = Budget::new(self.faction, view.stockpile(self.faction));
        self.run_economy(ctx, base, &units, &buildings, &mut budget);
        self.run_military(ctx, base, &units, &buildings, &mut budget);
        let intruders = self.defend_base(ctx, base, &units);
        self.update_objectives(ctx, &units, &buildings, intruders);

        debug!(
            faction = ?self.faction,
            phase = ?self.state.phase,
            units = units.len(),
            buildings = buildings.len(),
            threat = self.state.threat_level,
            objectives = ?self.state.objectives,
            requests = budget.mutations.len(),
            "strategic decision"
        );
        budget.mutations
    }

    fn update_phase(&mut self, units: usize, buildings: usize) {
        let phase = Phase::from_counts(units, buildings, &self.config);
        if phase != self.state.phase {
            info!(faction = ?self.faction, from = ?self.state.phase, to = ?phase, "phase changed");
            self.state.phase = phase;
        }
        self.state.economy.target_workers = phase.target_workers();
        self.state.military.target_army = phase.target_army();
    }

    fn forget_lost_groups(&mut self, groups: &CombatGroupManager) {
        for slot in [&mut self.defend_group, &mut self.scout_group, &mut self.attack_group] {
            if slot.is_some_and(|id| groups.group(id).is_none()) {
                *slot = None;
            }
        }
    }

    // -- economy --

    fn run_economy(
        &mut self,
        ctx: &mut StrategicContext<'_, '_>,
        base: Vec2,
        units: &[&Unit],
        buildings: &[&Building],
        budget: &mut Budget,
    ) {
        let workers: Vec<&Unit> = units.iter().copied().filter(|u| u.kind.is_worker()).collect();

        let queued_workers: usize = buildings.iter().map(|b| b.queued(UnitKind::Engineer)).sum();
        let mut deficit = self
            .state
            .economy
            .target_workers
            .saturating_sub(workers.len() + queued_workers);
        while deficit > 0 {
            match budget.queue_unit(UnitKind::Engineer, buildings, self.config.max_queue_per_building) {
                Production::Queued => deficit -= 1,
                _ => break,
            }
        }

        self.assign_workers(ctx, &workers, budget.bank);
        self.replenish_buildings(buildings);
        self.build_next(ctx, base, budget);
        self.try_expand(ctx, base, buildings, budget);
    }

    /// Send workers with nothing to do to the best zone with room
    fn assign_workers(&self, ctx: &mut StrategicContext<'_, '_>, workers: &[&Unit], bank: Stockpile) {
        let scarce = if bank.oil <= bank.steel {
            ResourceCategory::Oil
        } else {
            ResourceCategory::Steel
        };

        // Workers already walking to a zone count against its capacity
        let mut en_route: AHashMap<ZoneId, usize> = AHashMap::new();
        for command in ctx.controller.commands() {
            if let (CommandKind::Gather, CommandTarget::Zone(zone)) = (command.kind(), command.target()) {
                let assigned = ctx.zones.zone(zone).is_some_and(|z| z.has_worker(command.unit));
                if !assigned {
                    *en_route.entry(zone).or_default() += 1;
                }
            }
        }

        let buildings = ctx.index.view.buildings;
        for worker in workers {
            if ctx.zones.zone_of(worker.id).is_some()
                || ctx.controller.has_command(worker.id)
                || ctx.proposals.contains(worker.id)
            {
                continue;
            }

            let best = ctx
                .zones
                .zones()
                .iter()
                .filter(|z| !z.exhausted)
                .filter(|z| z.workers.len() + en_route.get(&z.id).copied().unwrap_or(0) < z.max_workers)
                .map(|z| {
                    let haul = nearest_drop_off(buildings, self.faction, z.center)
                        .map_or(0.0, |d| d.position.distance(&z.center));
                    let weight = self.state.economy.resource_priority.weight(z.category, scarce);
                    (z.id, (worker.position.distance(&z.center) + haul) * weight)
                })
                .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

            if let Some((zone, _)) = best {
                *en_route.entry(zone).or_default() += 1;
                ctx.proposals.propose(
                    worker.id,
                    Order::gather(zone),
                    CommandPriority::Normal,
                    ProposalSource::Strategic,
                );
            }
        }
    }

    /// Queue buildings whose count is below the phase's target
    fn replenish_buildings(&mut self, buildings: &[&Building]) {
        let desired = desired_buildings(self.state.phase, self.config.perimeter_posts);
        let economy = &mut self.state.economy;
        for (kind, wanted) in desired {
            let have = buildings.iter().filter(|b| b.kind == kind).count() + economy.queued(kind);
            for _ in have..wanted {
                economy.building_queue.push_back(kind);
            }
        }
    }

    fn build_next(&mut self, ctx: &StrategicContext<'_, '_>, base: Vec2, budget: &mut Budget) {
        if budget.bank.total() < self.config.build_gate || ctx.now_ms < self.state.economy.next_build_ms {
            return;
        }
        let Some(kind) = self.state.economy.building_queue.pop_front() else {
            return;
        };
        if !budget.bank.covers(&kind.stats().cost) {
            // Keep its place until it becomes affordable
            self.state.economy.building_queue.push_front(kind);
            return;
        }

        let preferred: &[Vec2] = if kind == BuildingKind::Turret {
            &self.state.perimeter
        } else {
            &[]
        };
        match find_site(kind, base, 3, preferred, ctx, &budget.placed) {
            Some(site) => {
                budget.place(kind, site);
                self.state.economy.next_build_ms = ctx.now_ms + self.config.build_cooldown_ms;
                debug!(faction = ?self.faction, ?kind, ?site, "construction ordered");
            }
            None => debug!(faction = ?self.faction, ?kind, "no building site found"),
        }
    }

    /// Found a new base next to an uncovered zone
    fn try_expand(&mut self, ctx: &StrategicContext<'_, '_>, base: Vec2, buildings: &[&Building], budget: &mut Budget) {
        if !self.expansion_ready(buildings.len(), budget.bank) {
            return;
        }
        let all_buildings = ctx.index.view.buildings;
        let target = ctx
            .zones
            .zones()
            .iter()
            .filter(|z| !z.exhausted)
            .filter(|z| {
                nearest_drop_off(all_buildings, self.faction, z.center)
                    .map_or(true, |d| d.position.distance(&z.center) > EXPANSION_REACH)
            })
            .min_by(|a, b| a.center.distance(&base).total_cmp(&b.center.distance(&base)));
        let Some(zone) = target else {
            return;
        };

        let clearance = (zone.radius + BuildingKind::Headquarters.stats().footprint_radius + SITE_GAP).ceil() as i32;
        if let Some(site) = find_site(BuildingKind::Headquarters, zone.center, clearance, &[], ctx, &budget.placed) {
            if budget.place(BuildingKind::Headquarters, site) {
                self.state.economy.expansions += 1;
                info!(faction = ?self.faction, zone = ?zone.id, ?site, "expanding");
            }
        }
    }

    fn expansion_ready(&self, building_count: usize, bank: Stockpile) -> bool {
        self.state.economy.expansions < self.config.max_expansions
            && building_count >= self.config.expansion_min_buildings
            && bank.total() >= self.config.expansion_threshold
    }

    // -- military --

    fn run_military(
        &mut self,
        ctx: &mut StrategicContext<'_, '_>,
        base: Vec2,
        units: &[&Unit],
        buildings: &[&Building],
        budget: &mut Budget,
    ) {
        let view = ctx.index.view;
        let army: Vec<&Unit> = units.iter().copied().filter(|u| u.can_fight()).collect();
        let queued_army: usize = buildings
            .iter()
            .map(|b| b.production_queue.iter().filter(|i| i.kind.is_combat()).count())
            .sum();
        let enemy_army = view.hostile_units(self.faction).filter(|u| u.can_fight()).count();

        let pressure = self.state.threat_level > self.config.high_threat_level;
        let military = &mut self.state.military;
        military.preferred_mix = preferred_mix(self.state.phase, pressure);

        if military.production_queue.is_empty() {
            military.production_queue.push_back(UnitKind::Infantry);
            military.production_queue.push_back(UnitKind::Infantry);
            if army.len() >= 6 {
                military.production_queue.push_back(UnitKind::Tank);
            }
            if enemy_army > army.len() {
                military.production_queue.push_back(UnitKind::Artillery);
            }
        }

        let mut planned = army.len() + queued_army + military.production_queue.len();
        let mut next = 0;
        while planned < military.target_army && !military.preferred_mix.is_empty() {
            let kind = military.preferred_mix[next % military.preferred_mix.len()];
            military.production_queue.push_back(kind);
            next += 1;
            planned += 1;
        }

        let mut produced = 0;
        while produced < MAX_PRODUCTION_PER_DECISION {
            let Some(kind) = self.state.military.production_queue.front().copied() else {
                break;
            };
            match budget.queue_unit(kind, buildings, self.config.max_queue_per_building) {
                Production::Queued => {
                    self.state.military.production_queue.pop_front();
                    produced += 1;
                }
                Production::NoTrainer => {
                    self.state.military.production_queue.pop_front();
                    self.request_trainer(kind, buildings);
                }
                Production::Busy | Production::Unaffordable => break,
            }
        }

        self.organize_defense(ctx, base, &army);
        self.organize_scouting(ctx, base, &army);
        self.organize_attack(ctx, base, &army);
    }

    fn request_trainer(&mut self, kind: UnitKind, buildings: &[&Building]) {
        let trainer = kind.stats().trained_at;
        let exists = buildings.iter().any(|b| b.kind == trainer);
        if !exists && self.state.economy.queued(trainer) == 0 {
            debug!(faction = ?self.faction, ?kind, ?trainer, "requesting trainer");
            self.state.economy.building_queue.push_back(trainer);
        }
    }

    fn is_free(&self, ctx: &StrategicContext<'_, '_>, unit: UnitId) -> bool {
        !ctx.controller.has_command(unit) && ctx.groups.group_of(unit).is_none() && !ctx.proposals.contains(unit)
    }

    /// Keep a defend group on the perimeter post facing the enemy
    fn organize_defense(&mut self, ctx: &mut StrategicContext<'_, '_>, base: Vec2, army: &[&Unit]) {
        let anchor = self.defense_anchor(&ctx.index.view, base);
        if let Some(group) = self.defend_group {
            ctx.groups.set_target(group, anchor);
            return;
        }
        let idle: Vec<UnitId> = army
            .iter()
            .filter(|u| u.kind != UnitKind::Scout && self.is_free(ctx, u.id))
            .map(|u| u.id)
            .collect();
        if idle.len() < self.config.min_defend_group.max(1) {
            return;
        }
        self.defend_group = ctx
            .groups
            .create_group(self.faction, &idle, GroupRole::Defend, Some(anchor), ctx.index);
        if self.defend_group.is_some() {
            info!(faction = ?self.faction, size = idle.len(), ?anchor, "defensive perimeter manned");
        }
    }

    /// Perimeter post closest to the nearest known enemy; the base itself
    /// when no enemy is visible or no perimeter is laid out
    fn defense_anchor(&self, view: &WorldView<'_>, base: Vec2) -> Vec2 {
        let nearest_enemy = view
            .hostile_units(self.faction)
            .map(|u| u.position)
            .chain(view.hostile_buildings(self.faction).map(|b| b.position))
            .min_by(|a, b| a.distance(&base).total_cmp(&b.distance(&base)));
        let Some(enemy) = nearest_enemy else {
            return base;
        };
        self.state
            .perimeter
            .iter()
            .copied()
            .min_by(|a, b| a.distance(&enemy).total_cmp(&b.distance(&enemy)))
            .unwrap_or(base)
    }

    fn organize_scouting(&mut self, ctx: &mut StrategicContext<'_, '_>, base: Vec2, army: &[&Unit]) {
        if self.scout_group.is_some() {
            return;
        }
        let Some(scout) = army
            .iter()
            .find(|u| u.kind == UnitKind::Scout && ctx.groups.group_of(u.id).is_none())
        else {
            return;
        };
        let target = farthest_point(ctx.grid, base);
        self.scout_group = ctx
            .groups
            .create_group(self.faction, &[scout.id], GroupRole::Scout, Some(target), ctx.index);
    }

    /// Launch or retarget the single large attack
    fn organize_attack(&mut self, ctx: &mut StrategicContext<'_, '_>, base: Vec2, army: &[&Unit]) {
        let target = self.select_target(&ctx.index.view, base);

        if let Some(group) = self.attack_group {
            if let Some(target) = target {
                ctx.groups.set_target(group, target);
            }
            return;
        }

        let cooled = self
            .state
            .military
            .last_attack_ms
            .map_or(true, |t| ctx.now_ms.saturating_sub(t) >= self.config.attack_cooldown_ms);
        if !cooled || army.len() < self.state.military.attack_threshold {
            return;
        }
        let Some(target) = target else {
            return;
        };

        let committed = ((army.len() as f32) * self.config.attack_fraction).ceil() as usize;
        let scouts = self.scout_group;
        let mut candidates: Vec<(bool, UnitId)> = army
            .iter()
            .filter_map(|u| {
                let group = ctx.groups.group_of(u.id);
                if group.is_some() && group == scouts {
                    return None;
                }
                Some((group.is_some(), u.id))
            })
            .collect();
        // Ungrouped units go first, defenders only make up the difference
        candidates.sort_by_key(|(grouped, _)| *grouped);
        let members: Vec<UnitId> = candidates.into_iter().take(committed).map(|(_, id)| id).collect();

        self.attack_group = ctx
            .groups
            .create_group(self.faction, &members, GroupRole::Attack, Some(target), ctx.index);
        if self.attack_group.is_some() {
            self.state.military.last_attack_ms = Some(ctx.now_ms);
            info!(faction = ?self.faction, size = members.len(), ?target, posture = ?self.config.posture, "attack launched");
        }
    }

    /// Attack destination according to the posture
    fn select_target(&self, view: &WorldView<'_>, base: Vec2) -> Option<Vec2> {
        let by_distance = |a: &Vec2, b: &Vec2| a.distance(&base).total_cmp(&b.distance(&base));
        let enemy_units = || view.hostile_units(self.faction).map(|u| u.position);

        match self.config.posture {
            AggressionPosture::Aggressive => enemy_units()
                .chain(view.hostile_buildings(self.faction).map(|b| b.position))
                .min_by(by_distance),
            AggressionPosture::Defensive => {
                let reach = self.config.base_defense_radius * 1.5;
                enemy_units()
                    .filter(|p| p.distance(&base) <= reach)
                    .min_by(by_distance)
            }
            AggressionPosture::Balanced => view
                .hostile_buildings(self.faction)
                .min_by(|a, b| a.health.total_cmp(&b.health).then_with(|| by_distance(&a.position, &b.position)))
                .map(|b| b.position)
                .or_else(|| Vec2::centroid(enemy_units())),
        }
    }

    /// Send idle, ungrouped combat units at enemies inside the base radius.
    /// Returns how many intruders were found.
    fn defend_base(&mut self, ctx: &mut StrategicContext<'_, '_>, base: Vec2, units: &[&Unit]) -> usize {
        let intruders: Vec<&Unit> = ctx
            .index
            .view
            .hostile_units(self.faction)
            .filter(|e| e.position.distance(&base) <= self.config.base_defense_radius)
            .collect();
        if intruders.is_empty() {
            return 0;
        }

        for unit in units {
            if !unit.can_fight() || !self.is_free(ctx, unit.id) {
                continue;
            }
            let nearest = intruders.iter().min_by(|a, b| {
                a.position
                    .distance(&unit.position)
                    .total_cmp(&b.position.distance(&unit.position))
            });
            if let Some(enemy) = nearest {
                ctx.proposals.propose(
                    unit.id,
                    Order::attack(enemy.id),
                    CommandPriority::High,
                    ProposalSource::BaseDefense,
                );
            }
        }
        intruders.len()
    }

    fn update_objectives(&mut self, ctx: &StrategicContext<'_, '_>, units: &[&Unit], buildings: &[&Building], intruders: usize) {
        let workers = units.iter().filter(|u| u.kind.is_worker()).count();
        let army = units.iter().filter(|u| u.can_fight()).count();
        let bank = ctx.index.view.stockpile(self.faction);

        let mut objectives = Vec::new();
        if workers < self.state.economy.target_workers {
            objectives.push(Objective::GrowEconomy);
        }
        if army < self.state.military.target_army {
            objectives.push(Objective::BuildArmy);
        }
        if intruders > 0 || self.state.threat_level > self.config.high_threat_level {
            objectives.push(Objective::DefendBase);
        }
        if self.expansion_ready(buildings.len(), bank) {
            objectives.push(Objective::Expand);
        }
        if self.scout_group.is_some() {
            objectives.push(Objective::Scout);
        }
        if self.attack_group.is_some() {
            objectives.push(Objective::Attack);
        }
        self.state.objectives = objectives;
    }
}

/// Map point (inset from the edge) farthest from `from`
fn farthest_point(grid: &TerrainGrid, from: Vec2) -> Vec2 {
    let max_x = grid.width().saturating_sub(1) as f32;
    let max_y = grid.height().saturating_sub(1) as f32;
    let inset_x = SCOUT_INSET.min(max_x / 2.0);
    let inset_y = SCOUT_INSET.min(max_y / 2.0);
    [
        Vec2::new(inset_x, inset_y),
        Vec2::new(max_x - inset_x, inset_y),
        Vec2::new(inset_x, max_y - inset_y),
        Vec2::new(max_x - inset_x, max_y - inset_y),
    ]
    .into_iter()
    .max_by(|a, b| a.distance(&from).total_cmp(&b.distance(&from)))
    .unwrap_or(from)
}

/// First valid site among `preferred`, then on square rings around `around`
/// starting at `min_ring` tiles out
fn find_site(
    kind: BuildingKind,
    around: Vec2,
    min_ring: i32,
    preferred: &[Vec2],
    ctx: &StrategicContext<'_, '_>,
    placed: &[(BuildingKind, Vec2)],
) -> Option<Vec2> {
    let center = TileCoord::from_position(around);
    let rings = (min_ring.max(0)..=SITE_SEARCH_RADIUS).flat_map(move |r| {
        (-r..=r).flat_map(move |dy| {
            (-r..=r)
                .filter(move |dx| dx.abs().max(dy.abs()) == r)
                .map(move |dx| TileCoord::new(center.x + dx, center.y + dy).to_position())
        })
    });

    preferred
        .iter()
        .map(|p| TileCoord::from_position(*p).to_position())
        .chain(rings)
        .find(|site| site_is_clear(kind, *site, ctx, placed))
}

fn site_is_clear(kind: BuildingKind, site: Vec2, ctx: &StrategicContext<'_, '_>, placed: &[(BuildingKind, Vec2)]) -> bool {
    let footprint = kind.stats().footprint_radius;
    let grid = ctx.grid;
    let reach = footprint.ceil() as i32;
    let tile = TileCoord::from_position(site);

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let coord = TileCoord::new(tile.x + dx, tile.y + dy);
            if coord.to_position().distance(&site) > footprint {
                continue;
            }
            if !grid.is_passable(coord) {
                return false;
            }
        }
    }

    let clear_of = |other: BuildingKind, position: Vec2| {
        position.distance(&site) >= footprint + other.stats().footprint_radius + SITE_GAP
    };
    ctx.index.view.buildings.iter().all(|b| clear_of(b.kind, b.position))
        && placed.iter().all(|(k, p)| clear_of(*k, *p))
        && ctx
            .zones
            .zones()
            .iter()
            .all(|z| z.center.distance(&site) > z.radius + footprint)
}
