//! Per-tick execution of unit commands
//!
//! One table maps each unit to its single active command. `process` walks
//! the table once per tick, moves units along cached paths, resolves combat
//! and gathering, and returns the resulting mutations for the collaborator.

use std::collections::VecDeque;

use ahash::AHashMap;
use tracing::{debug, trace};

use crate::command::proposals::Proposal;
use crate::command::types::{CommandIssuer, CommandKind, CommandTarget, Order, UnitCommand};
use crate::core::config::{CommandConfig, PathConfig};
use crate::core::types::{BuildingId, CommandId, FactionId, TimeMs, UnitId, Vec2};
use crate::resource::ResourceZoneAllocator;
use crate::tactics::ThreatAssessment;
use crate::terrain::{find_path, PathOptions, TerrainGrid};
use crate::world::{Building, Unit, UnitTask, WorldIndex, WorldMutation};

/// Why a command left the active table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Goal reached
    Completed,
    TargetDestroyed,
    /// Target unit or building no longer exists
    TargetLost,
    /// Zone missing or exhausted
    ZoneUnavailable,
    /// Zone at worker capacity
    ZoneFull,
    Expired,
    /// The commanded unit is gone
    UnitLost,
    /// Kind and target do not fit the unit
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndedCommand {
    pub unit: UnitId,
    pub command: CommandId,
    pub kind: CommandKind,
    pub reason: EndReason,
}

/// Everything one `process` call produced
#[derive(Debug, Default)]
pub struct CommandOutcome {
    pub mutations: Vec<WorldMutation>,
    pub ended: Vec<EndedCommand>,
    pub path_requests: usize,
}

/// Result of committing a proposal
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    /// Same kind and target as the active command; nothing changed
    Unchanged,
    Issued { replaced: Option<UnitCommand> },
}

/// Borrowed state the controller needs for one tick
pub struct CommandContext<'w, 'a> {
    pub index: &'w WorldIndex<'a>,
    pub grid: &'w TerrainGrid,
    pub zones: &'w mut ResourceZoneAllocator,
    pub threats: &'w AHashMap<FactionId, ThreatAssessment>,
    pub now_ms: TimeMs,
    pub delta_ms: TimeMs,
}

#[derive(Debug, Clone)]
struct ActiveCommand {
    command: UnitCommand,
    path: VecDeque<Vec2>,
    /// Goal the cached path was computed for
    path_goal: Option<Vec2>,
    /// Patrol start, captured on the first tick
    origin: Option<Vec2>,
    /// Current patrol leg endpoint
    leg: Option<Vec2>,
    started: bool,
}

impl ActiveCommand {
    fn new(command: UnitCommand) -> Self {
        Self {
            command,
            path: VecDeque::new(),
            path_goal: None,
            origin: None,
            leg: None,
            started: false,
        }
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.path_goal = None;
    }
}

enum Step {
    Continue,
    Done(EndReason),
    Replace(UnitCommand),
}

/// Damage already dealt this tick, so later attackers see the reduced health
#[derive(Debug, Default)]
struct PendingDamage {
    units: AHashMap<UnitId, f32>,
    buildings: AHashMap<BuildingId, f32>,
}

impl PendingDamage {
    fn unit_health(&self, unit: &Unit) -> f32 {
        unit.health - self.units.get(&unit.id).copied().unwrap_or(0.0)
    }

    fn building_health(&self, building: &Building) -> f32 {
        building.health - self.buildings.get(&building.id).copied().unwrap_or(0.0)
    }
}

#[derive(Debug)]
pub struct UnitCommandController {
    active: AHashMap<UnitId, ActiveCommand>,
    /// Earliest time each unit may fire again
    ready_at: AHashMap<UnitId, TimeMs>,
    config: CommandConfig,
    paths: PathConfig,
    path_requests: usize,
}

impl UnitCommandController {
    pub fn new(config: CommandConfig, paths: PathConfig) -> Self {
        Self {
            active: AHashMap::new(),
            ready_at: AHashMap::new(),
            config,
            paths,
            path_requests: 0,
        }
    }

    /// Make `command` the unit's only command, returning the one it replaced
    pub fn issue(&mut self, command: UnitCommand) -> Option<UnitCommand> {
        let unit = command.unit;
        let replaced = self
            .active
            .insert(unit, ActiveCommand::new(command))
            .map(|a| a.command);
        if let Some(old) = &replaced {
            trace!(?unit, kind = ?old.kind(), "command replaced");
        }
        replaced
    }

    /// Issue a resolved proposal unless the unit already runs the same order
    pub fn commit(&mut self, proposal: &Proposal, now_ms: TimeMs) -> Commit {
        if self.is_running(proposal.unit, &proposal.order) {
            return Commit::Unchanged;
        }
        let command = UnitCommand::new(
            proposal.unit,
            proposal.order,
            proposal.priority,
            CommandIssuer::Ai,
            now_ms,
        );
        Commit::Issued {
            replaced: self.issue(command),
        }
    }

    pub fn cancel(&mut self, unit: UnitId) -> Option<UnitCommand> {
        self.active.remove(&unit).map(|a| a.command)
    }

    pub fn active_command(&self, unit: UnitId) -> Option<&UnitCommand> {
        self.active.get(&unit).map(|a| &a.command)
    }

    pub fn has_command(&self, unit: UnitId) -> bool {
        self.active.contains_key(&unit)
    }

    pub fn is_running(&self, unit: UnitId, order: &Order) -> bool {
        self.active
            .get(&unit)
            .is_some_and(|a| a.command.order == *order)
    }

    pub fn commands(&self) -> impl Iterator<Item = &UnitCommand> {
        self.active.values().map(|a| &a.command)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Remaining waypoints of the unit's cached path
    pub fn cached_path(&self, unit: UnitId) -> Option<&VecDeque<Vec2>> {
        self.active.get(&unit).map(|a| &a.path)
    }

    /// (attacker, target) for every attack command against a unit
    pub fn attack_targets(&self) -> impl Iterator<Item = (UnitId, UnitId)> + '_ {
        self.active
            .values()
            .filter_map(|a| a.command.attack_target().map(|t| (a.command.unit, t)))
    }

    /// Advance every active command by one tick
    pub fn process(&mut self, ctx: &mut CommandContext<'_, '_>) -> CommandOutcome {
        let mut out = CommandOutcome::default();
        let mut pending = PendingDamage::default();
        self.path_requests = 0;
        self.ready_at.retain(|id, _| ctx.index.is_alive(*id));

        let mut order: Vec<(TimeMs, UnitId)> = self
            .active
            .values()
            .map(|a| (a.command.created_ms, a.command.unit))
            .collect();
        order.sort_unstable();

        for (_, unit_id) in order {
            let Some(mut active) = self.active.remove(&unit_id) else {
                continue;
            };

            if active.command.age(ctx.now_ms) >= self.config.timeout_ms {
                self.finish(active, EndReason::Expired, ctx, &mut out);
                continue;
            }
            let Some(unit) = ctx.index.unit(unit_id) else {
                self.finish(active, EndReason::UnitLost, ctx, &mut out);
                continue;
            };
            if !active.command.order.is_well_formed() {
                self.finish(active, EndReason::Invalid, ctx, &mut out);
                continue;
            }

            if !active.started {
                active.started = true;
                out.mutations.push(WorldMutation::SetTask {
                    unit: unit_id,
                    task: active.command.kind().task(),
                    target: order_position(&active.command.order, ctx),
                });
            }

            let step = match active.command.kind() {
                CommandKind::Move => self.step_move(unit, &mut active, ctx, &mut out),
                CommandKind::Attack => self.step_attack(unit, &mut active, ctx, &mut pending, &mut out),
                CommandKind::Gather => self.step_gather(unit, &mut active, ctx, &mut out),
                CommandKind::Patrol => self.step_patrol(unit, &mut active, ctx, &mut out),
                CommandKind::Guard => self.step_guard(unit, &mut active, ctx, &mut out),
            };

            match step {
                Step::Continue => {
                    self.active.insert(unit_id, active);
                }
                Step::Done(reason) => self.finish(active, reason, ctx, &mut out),
                Step::Replace(next) => {
                    if active.command.kind() == CommandKind::Gather {
                        ctx.zones.release(unit_id);
                    }
                    debug!(unit = ?unit_id, from = ?active.command.kind(), to = ?next.kind(), "command escalated");
                    self.active.insert(unit_id, ActiveCommand::new(next));
                }
            }
        }

        out.path_requests = self.path_requests;
        out
    }

    fn finish(
        &mut self,
        active: ActiveCommand,
        reason: EndReason,
        ctx: &mut CommandContext<'_, '_>,
        out: &mut CommandOutcome,
    ) {
        let command = active.command;
        if command.kind() == CommandKind::Gather {
            ctx.zones.release(command.unit);
        }
        if ctx.index.is_alive(command.unit) {
            out.mutations.push(WorldMutation::SetTask {
                unit: command.unit,
                task: UnitTask::Idle,
                target: None,
            });
        }
        debug!(unit = ?command.unit, kind = ?command.kind(), ?reason, "command ended");
        out.ended.push(EndedCommand {
            unit: command.unit,
            command: command.id,
            kind: command.kind(),
            reason,
        });
    }

    fn step_move(
        &mut self,
        unit: &Unit,
        active: &mut ActiveCommand,
        ctx: &CommandContext<'_, '_>,
        out: &mut CommandOutcome,
    ) -> Step {
        let CommandTarget::Position(goal) = active.command.target() else {
            return Step::Done(EndReason::Invalid);
        };
        if unit.position.distance(&goal) <= self.config.arrive_epsilon {
            return Step::Done(EndReason::Completed);
        }
        self.advance(unit, active, goal, None, ctx, out);
        Step::Continue
    }

    fn step_attack(
        &mut self,
        unit: &Unit,
        active: &mut ActiveCommand,
        ctx: &CommandContext<'_, '_>,
        pending: &mut PendingDamage,
        out: &mut CommandOutcome,
    ) -> Step {
        if !unit.can_fight() {
            return Step::Done(EndReason::Invalid);
        }

        let (position, reach, health, building) = match active.command.target() {
            CommandTarget::Unit(id) => match ctx.index.unit(id) {
                Some(target) => (target.position, 0.0, pending.unit_health(target), None),
                None => return Step::Done(EndReason::TargetLost),
            },
            CommandTarget::Building(id) => match ctx.index.building(id) {
                Some(target) => (
                    target.position,
                    target.kind.stats().footprint_radius,
                    pending.building_health(target),
                    Some(id),
                ),
                None => return Step::Done(EndReason::TargetLost),
            },
            _ => return Step::Done(EndReason::Invalid),
        };
        if health <= 0.0 {
            return Step::Done(EndReason::TargetDestroyed);
        }

        if unit.position.distance(&position) - reach > unit.attack_range {
            // Chase without giving up the attack
            self.advance(unit, active, position, building, ctx, out);
            return Step::Continue;
        }
        active.clear_path();

        if self.ready_at.get(&unit.id).is_some_and(|t| ctx.now_ms < *t) {
            return Step::Continue;
        }
        self.ready_at
            .insert(unit.id, ctx.now_ms + unit.kind.stats().attack_cooldown_ms);

        let damage = unit.damage.min(health);
        match active.command.target() {
            CommandTarget::Building(id) => {
                *pending.buildings.entry(id).or_default() += damage;
                out.mutations.push(WorldMutation::DamageBuilding { building: id, amount: damage });
            }
            CommandTarget::Unit(id) => {
                *pending.units.entry(id).or_default() += damage;
                out.mutations.push(WorldMutation::DamageUnit { unit: id, amount: damage });
            }
            _ => {}
        }

        if health - damage <= 0.0 {
            Step::Done(EndReason::TargetDestroyed)
        } else {
            Step::Continue
        }
    }

    fn step_gather(
        &mut self,
        unit: &Unit,
        active: &mut ActiveCommand,
        ctx: &mut CommandContext<'_, '_>,
        out: &mut CommandOutcome,
    ) -> Step {
        if !unit.kind.is_worker() {
            return Step::Done(EndReason::Invalid);
        }
        let CommandTarget::Zone(zone_id) = active.command.target() else {
            return Step::Done(EndReason::Invalid);
        };
        let Some(zone) = ctx.zones.zone(zone_id) else {
            return Step::Done(EndReason::ZoneUnavailable);
        };
        if zone.exhausted {
            return Step::Done(EndReason::ZoneUnavailable);
        }

        if zone.contains(unit.position) {
            active.clear_path();
            if ctx.zones.assign(zone_id, unit.id) {
                Step::Continue
            } else {
                Step::Done(EndReason::ZoneFull)
            }
        } else {
            let center = zone.center;
            self.advance(unit, active, center, None, ctx, out);
            Step::Continue
        }
    }

    /// Walk to whichever endpoint is farther, turning around on arrival
    fn step_patrol(
        &mut self,
        unit: &Unit,
        active: &mut ActiveCommand,
        ctx: &CommandContext<'_, '_>,
        out: &mut CommandOutcome,
    ) -> Step {
        let CommandTarget::Position(point) = active.command.target() else {
            return Step::Done(EndReason::Invalid);
        };
        let origin = *active.origin.get_or_insert(unit.position);

        let arrived = active
            .leg
            .map_or(true, |leg| unit.position.distance(&leg) <= self.config.arrive_epsilon);
        if arrived {
            let next = if unit.position.distance(&origin) > unit.position.distance(&point) {
                origin
            } else {
                point
            };
            active.leg = Some(next);
        }

        if let Some(leg) = active.leg {
            if unit.position.distance(&leg) > self.config.arrive_epsilon {
                self.advance(unit, active, leg, None, ctx, out);
            }
        }
        Step::Continue
    }

    fn step_guard(
        &mut self,
        unit: &Unit,
        active: &mut ActiveCommand,
        ctx: &CommandContext<'_, '_>,
        out: &mut CommandOutcome,
    ) -> Step {
        let (guarded, reach, building) = match active.command.target() {
            CommandTarget::Unit(id) => match ctx.index.unit(id) {
                Some(u) => (u.position, 0.0, None),
                None => return Step::Done(EndReason::TargetLost),
            },
            CommandTarget::Building(id) => match ctx.index.building(id) {
                Some(b) => (b.position, b.kind.stats().footprint_radius, Some(id)),
                None => return Step::Done(EndReason::TargetLost),
            },
            _ => return Step::Done(EndReason::Invalid),
        };

        if unit.can_fight() {
            let threat = ctx.threats.get(&unit.faction).and_then(|threats| {
                threats.nearest_within(guarded, self.config.guard_scan_radius, ctx.now_ms, |e| {
                    ctx.index.is_alive(e.unit)
                })
            });
            if let Some(entry) = threat {
                return Step::Replace(UnitCommand::new(
                    unit.id,
                    Order::attack(entry.unit),
                    active.command.priority,
                    CommandIssuer::Ai,
                    ctx.now_ms,
                ));
            }
        }

        if unit.position.distance(&guarded) > self.config.guard_leash + reach {
            self.advance(unit, active, guarded, building, ctx, out);
        } else {
            active.clear_path();
        }
        Step::Continue
    }

    /// Move the unit along its cached path toward `goal`, requesting a new
    /// path when there is none or the goal drifted. Units over this tick's
    /// path budget hold position.
    fn advance(
        &mut self,
        unit: &Unit,
        active: &mut ActiveCommand,
        goal: Vec2,
        toward: Option<BuildingId>,
        ctx: &CommandContext<'_, '_>,
        out: &mut CommandOutcome,
    ) {
        let drifted = active
            .path_goal
            .map_or(true, |g| g.distance(&goal) > self.paths.repath_distance);
        if active.path.is_empty() || drifted {
            if self.path_requests >= self.paths.max_requests_per_tick {
                trace!(unit = ?unit.id, "path budget spent, holding");
                return;
            }
            self.path_requests += 1;
            let options = PathOptions::from_config(&self.paths)
                .for_unit(unit.id)
                .toward_building(toward);
            let path = find_path(
                ctx.grid,
                unit.position,
                goal,
                ctx.index.view.units,
                ctx.index.view.buildings,
                &options,
            );
            trace!(unit = ?unit.id, waypoints = path.len(), "path computed");
            active.path = path.into();
            active.path_goal = Some(goal);
        }

        let epsilon = self.config.arrive_epsilon;
        let mut position = unit.position;
        let mut budget = unit.speed * ctx.delta_ms as f32 / 1000.0;

        while budget > 0.0 {
            let Some(waypoint) = active.path.front().copied() else {
                break;
            };
            let distance = position.distance(&waypoint);
            if distance <= epsilon && active.path.len() > 1 {
                active.path.pop_front();
                continue;
            }
            let step = budget.min(distance);
            position = position.step_toward(&waypoint, step);
            budget -= step;
            if position.distance(&waypoint) <= epsilon {
                active.path.pop_front();
            }
            if step <= 0.0 {
                break;
            }
        }

        if position != unit.position {
            out.mutations.push(WorldMutation::MoveUnit {
                unit: unit.id,
                position,
            });
        }
    }
}

/// Where the command points, for the unit's task tag
fn order_position(order: &Order, ctx: &CommandContext<'_, '_>) -> Option<Vec2> {
    match order.target {
        CommandTarget::Position(p) => Some(p),
        CommandTarget::Unit(id) => ctx.index.unit(id).map(|u| u.position),
        CommandTarget::Building(id) => ctx.index.building(id).map(|b| b.position),
        CommandTarget::Zone(id) => ctx.zones.zone(id).map(|z| z.center),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::types::CommandPriority;
    use crate::core::config::{ThreatConfig, ZoneConfig};
    use crate::core::types::ZoneId;
    use crate::resource::{ResourceCategory, ResourceZone};
    use crate::world::{UnitKind, World};

    const US: FactionId = FactionId(0);
    const THEM: FactionId = FactionId(1);

    struct Harness {
        world: World,
        grid: TerrainGrid,
        zones: ResourceZoneAllocator,
        threats: AHashMap<FactionId, ThreatAssessment>,
        controller: UnitCommandController,
        now: TimeMs,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                world: World::new(),
                grid: TerrainGrid::open(40, 40),
                zones: ResourceZoneAllocator::new(ZoneConfig::default().extraction_rate),
                threats: AHashMap::new(),
                controller: UnitCommandController::new(CommandConfig::default(), PathConfig::default()),
                now: 0,
            }
        }

        fn order(&mut self, unit: UnitId, order: Order) {
            let command = UnitCommand::new(unit, order, CommandPriority::Normal, CommandIssuer::External, self.now);
            self.controller.issue(command);
        }

        fn tick(&mut self, delta_ms: TimeMs) -> CommandOutcome {
            self.now += delta_ms;
            let snapshot = self.world.snapshot();
            let view = snapshot.view();
            let index = view.index();
            for threats in self.threats.values_mut() {
                threats.refresh(&view, self.now);
            }
            let mut ctx = CommandContext {
                index: &index,
                grid: &self.grid,
                zones: &mut self.zones,
                threats: &self.threats,
                now_ms: self.now,
                delta_ms,
            };
            let outcome = self.controller.process(&mut ctx);
            self.world.apply(&outcome.mutations);
            outcome
        }
    }

    #[test]
    fn test_move_reaches_goal_then_ends() {
        let mut h = Harness::new();
        let unit = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(2.0, 2.0));
        h.order(unit, Order::move_to(Vec2::new(6.0, 2.0)));

        let first = h.tick(500);
        assert!(matches!(
            first.mutations[0],
            WorldMutation::SetTask { task: UnitTask::Moving, .. }
        ));
        // 2 tiles/s for half a second
        let moved = h.world.unit(unit).unwrap().position;
        assert!((moved.x - 3.0).abs() < 1e-4);

        for _ in 0..10 {
            h.tick(500);
        }
        let unit_state = h.world.unit(unit).unwrap();
        assert!(unit_state.position.distance(&Vec2::new(6.0, 2.0)) < 0.3);
        assert_eq!(unit_state.task, UnitTask::Idle);
        assert!(!h.controller.has_command(unit));
    }

    #[test]
    fn test_issue_replaces_previous_command() {
        let mut h = Harness::new();
        let unit = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(2.0, 2.0));
        h.order(unit, Order::move_to(Vec2::new(6.0, 2.0)));
        h.order(unit, Order::move_to(Vec2::new(2.0, 9.0)));

        assert_eq!(h.controller.len(), 1);
        assert_eq!(
            h.controller.active_command(unit).unwrap().order,
            Order::move_to(Vec2::new(2.0, 9.0))
        );
    }

    #[test]
    fn test_commands_expire_after_timeout() {
        let mut h = Harness::new();
        let unit = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(2.0, 2.0));
        let other = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(3.0, 3.0));
        h.order(unit, Order::patrol(Vec2::new(10.0, 2.0)));
        h.order(other, Order::guard(unit));

        h.tick(59_999);
        assert_eq!(h.controller.len(), 2);
        let outcome = h.tick(1);
        assert!(h.controller.is_empty());
        assert!(outcome.ended.iter().all(|e| e.reason == EndReason::Expired));
    }

    #[test]
    fn test_attack_applies_capped_damage_and_ends_on_kill() {
        let mut h = Harness::new();
        let attacker = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(5.0, 5.0));
        let target = h.world.spawn_unit(THEM, UnitKind::Engineer, Vec2::new(6.0, 5.0));
        h.world.unit_mut(target).unwrap().health = 4.0;
        h.order(attacker, Order::attack(target));

        let outcome = h.tick(100);
        assert!(outcome
            .mutations
            .contains(&WorldMutation::DamageUnit { unit: target, amount: 4.0 }));
        assert!(h.world.unit(target).is_none());
        assert_eq!(outcome.ended[0].reason, EndReason::TargetDestroyed);
    }

    #[test]
    fn test_attack_respects_cooldown() {
        let mut h = Harness::new();
        let attacker = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(5.0, 5.0));
        let target = h.world.spawn_unit(THEM, UnitKind::Tank, Vec2::new(6.0, 5.0));
        h.order(attacker, Order::attack(target));

        let hits = |o: &CommandOutcome| {
            o.mutations
                .iter()
                .filter(|m| matches!(m, WorldMutation::DamageUnit { .. }))
                .count()
        };
        assert_eq!(hits(&h.tick(100)), 1);
        assert_eq!(hits(&h.tick(100)), 0);
        assert_eq!(hits(&h.tick(1_000)), 1);
    }

    #[test]
    fn test_attackers_do_not_overkill() {
        let mut h = Harness::new();
        let a = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(5.0, 5.0));
        let b = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(5.0, 6.0));
        let target = h.world.spawn_unit(THEM, UnitKind::Engineer, Vec2::new(6.0, 5.0));
        h.world.unit_mut(target).unwrap().health = 8.0;
        h.order(a, Order::attack(target));
        h.order(b, Order::attack(target));

        let outcome = h.tick(100);
        let dealt: f32 = outcome
            .mutations
            .iter()
            .filter_map(|m| match m {
                WorldMutation::DamageUnit { amount, .. } => Some(*amount),
                _ => None,
            })
            .sum();
        assert_eq!(dealt, 8.0);
        assert_eq!(outcome.ended.len(), 2);
    }

    #[test]
    fn test_attack_out_of_range_chases() {
        let mut h = Harness::new();
        let attacker = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(2.0, 2.0));
        let target = h.world.spawn_unit(THEM, UnitKind::Infantry, Vec2::new(12.0, 2.0));
        h.order(attacker, Order::attack(target));

        let outcome = h.tick(1_000);
        assert!(outcome
            .mutations
            .iter()
            .any(|m| matches!(m, WorldMutation::MoveUnit { unit, .. } if *unit == attacker)));
        assert_eq!(
            h.controller.active_command(attacker).unwrap().kind(),
            CommandKind::Attack
        );
    }

    #[test]
    fn test_attack_building_target() {
        let mut h = Harness::new();
        let attacker = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(5.0, 5.0));
        let turret = h.world.spawn_building(THEM, crate::world::BuildingKind::Turret, Vec2::new(7.0, 5.0), true);
        h.order(attacker, Order::attack_building(turret));

        let outcome = h.tick(100);
        assert!(outcome
            .mutations
            .iter()
            .any(|m| matches!(m, WorldMutation::DamageBuilding { building, .. } if *building == turret)));
    }

    #[test]
    fn test_dead_target_drops_command() {
        let mut h = Harness::new();
        let attacker = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(2.0, 2.0));
        let target = h.world.spawn_unit(THEM, UnitKind::Infantry, Vec2::new(12.0, 2.0));
        h.order(attacker, Order::attack(target));
        h.world.remove_unit(target);

        let outcome = h.tick(100);
        assert_eq!(outcome.ended[0].reason, EndReason::TargetLost);
        assert_eq!(h.world.unit(attacker).unwrap().task, UnitTask::Idle);
    }

    #[test]
    fn test_gather_walks_in_then_registers() {
        let mut h = Harness::new();
        h.zones = ResourceZoneAllocator::from_zones(
            vec![ResourceZone::new(ZoneId(0), ResourceCategory::Oil, Vec2::new(10.0, 2.0), 2.0, 500.0, 1)],
            2.0,
        );
        let worker = h.world.spawn_unit(US, UnitKind::Engineer, Vec2::new(2.0, 2.0));
        h.order(worker, Order::gather(ZoneId(0)));

        for _ in 0..8 {
            h.tick(500);
        }
        assert_eq!(h.zones.zone_of(worker), Some(ZoneId(0)));
        assert_eq!(h.world.unit(worker).unwrap().task, UnitTask::Gathering);
        assert!(h.controller.has_command(worker));
    }

    #[test]
    fn test_exhausted_zone_releases_gatherer() {
        let mut h = Harness::new();
        h.zones = ResourceZoneAllocator::from_zones(
            vec![ResourceZone::new(ZoneId(0), ResourceCategory::Oil, Vec2::new(5.0, 5.0), 2.0, 1.0, 2)],
            2.0,
        );
        let worker = h.world.spawn_unit(US, UnitKind::Engineer, Vec2::new(5.0, 5.0));
        h.order(worker, Order::gather(ZoneId(0)));
        h.tick(100);
        assert_eq!(h.zones.zone_of(worker), Some(ZoneId(0)));

        h.zones.extract(1_000);
        let outcome = h.tick(100);
        assert_eq!(outcome.ended[0].reason, EndReason::ZoneUnavailable);
        assert_eq!(h.world.unit(worker).unwrap().task, UnitTask::Idle);
    }

    #[test]
    fn test_gather_on_full_zone_is_dropped() {
        let mut h = Harness::new();
        h.zones = ResourceZoneAllocator::from_zones(
            vec![ResourceZone::new(ZoneId(0), ResourceCategory::Steel, Vec2::new(5.0, 5.0), 3.0, 500.0, 1)],
            2.0,
        );
        let first = h.world.spawn_unit(US, UnitKind::Engineer, Vec2::new(5.0, 5.0));
        let second = h.world.spawn_unit(US, UnitKind::Engineer, Vec2::new(6.0, 5.0));
        h.order(first, Order::gather(ZoneId(0)));
        h.order(second, Order::gather(ZoneId(0)));

        let outcome = h.tick(100);
        assert!(h.controller.has_command(first));
        assert!(!h.controller.has_command(second));
        assert_eq!(outcome.ended[0].reason, EndReason::ZoneFull);
    }

    #[test]
    fn test_guard_escalates_to_attack() {
        let mut h = Harness::new();
        h.threats.insert(US, ThreatAssessment::new(US, &ThreatConfig::default()));
        let hq = h.world.spawn_building(US, crate::world::BuildingKind::Headquarters, Vec2::new(10.0, 10.0), true);
        let guard = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(12.0, 12.0));
        h.order(guard, Order::guard_building(hq));

        h.tick(100);
        assert_eq!(h.controller.active_command(guard).unwrap().kind(), CommandKind::Guard);

        let raider = h.world.spawn_unit(THEM, UnitKind::Scout, Vec2::new(15.0, 10.0));
        h.tick(100);
        assert_eq!(h.controller.active_command(guard).unwrap().order, Order::attack(raider));
    }

    #[test]
    fn test_patrol_turns_around() {
        let mut h = Harness::new();
        let unit = h.world.spawn_unit(US, UnitKind::Scout, Vec2::new(2.0, 2.0));
        h.order(unit, Order::patrol(Vec2::new(6.0, 2.0)));

        for _ in 0..4 {
            h.tick(250);
        }
        let out = h.world.unit(unit).unwrap().position;
        assert!(out.distance(&Vec2::new(6.0, 2.0)) < 0.3);

        for _ in 0..4 {
            h.tick(250);
        }
        let back = h.world.unit(unit).unwrap().position;
        assert!(back.distance(&Vec2::new(2.0, 2.0)) < 0.3);
        assert!(h.controller.has_command(unit));
    }

    #[test]
    fn test_path_budget_holds_extra_units() {
        let mut h = Harness::new();
        h.controller = UnitCommandController::new(
            CommandConfig::default(),
            PathConfig {
                max_requests_per_tick: 1,
                ..PathConfig::default()
            },
        );
        let a = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(2.0, 2.0));
        let b = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(2.0, 6.0));
        h.order(a, Order::move_to(Vec2::new(12.0, 2.0)));
        h.order(b, Order::move_to(Vec2::new(12.0, 6.0)));

        let outcome = h.tick(500);
        assert_eq!(outcome.path_requests, 1);
        let moves = outcome
            .mutations
            .iter()
            .filter(|m| matches!(m, WorldMutation::MoveUnit { .. }))
            .count();
        assert_eq!(moves, 1);

        let outcome = h.tick(500);
        assert_eq!(outcome.path_requests, 1);
        assert_eq!(
            outcome
                .mutations
                .iter()
                .filter(|m| matches!(m, WorldMutation::MoveUnit { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_commit_skips_unchanged_order() {
        let mut h = Harness::new();
        let unit = h.world.spawn_unit(US, UnitKind::Infantry, Vec2::new(2.0, 2.0));
        let proposal = Proposal {
            unit,
            order: Order::move_to(Vec2::new(9.0, 9.0)),
            priority: CommandPriority::Normal,
            source: crate::command::ProposalSource::Strategic,
        };
        assert!(matches!(h.controller.commit(&proposal, 0), Commit::Issued { replaced: None }));
        let id = h.controller.active_command(unit).unwrap().id;
        assert_eq!(h.controller.commit(&proposal, 5_000), Commit::Unchanged);
        assert_eq!(h.controller.active_command(unit).unwrap().id, id);
    }
}
