//! Combat groups and their per-tick role behavior

use ahash::AHashSet;
use serde::Serialize;
use slotmap::SlotMap;
use tracing::debug;

use crate::command::{CommandPriority, Order, ProposalBuffer, ProposalSource};
use crate::core::config::GroupConfig;
use crate::core::types::{FactionId, GroupId, UnitId, Vec2};
use crate::tactics::formation::{formation_offsets, FormationShape, GroupRole};
use crate::world::{Unit, WorldIndex};

/// A member and the formation slot it was given at creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupMember {
    pub unit: UnitId,
    pub slot: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombatGroup {
    pub id: GroupId,
    pub faction: FactionId,
    pub role: GroupRole,
    pub members: Vec<GroupMember>,
    pub target: Option<Vec2>,
    /// Where defenders hold; the target when one was given, else the members' centroid
    pub anchor: Vec2,
    /// Sized to the member count at creation
    pub formation: Vec<Vec2>,
    pub leader: Option<UnitId>,
    sequence: u64,
}

impl CombatGroup {
    pub fn member_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.members.iter().map(|m| m.unit)
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.members.iter().any(|m| m.unit == unit)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn slot_position(&self, center: Vec2, member: &GroupMember) -> Vec2 {
        center + self.formation.get(member.slot).copied().unwrap_or(Vec2::ZERO)
    }
}

/// Owns every combat group in the match
#[derive(Debug)]
pub struct CombatGroupManager {
    groups: SlotMap<GroupId, CombatGroup>,
    config: GroupConfig,
    next_sequence: u64,
}

impl CombatGroupManager {
    pub fn new(config: GroupConfig) -> Self {
        Self {
            groups: SlotMap::with_key(),
            config,
            next_sequence: 0,
        }
    }

    /// Form a group from live units of `faction`.
    ///
    /// Units are taken out of any group they already belong to. Returns None
    /// when no eligible unit remains.
    pub fn create_group(
        &mut self,
        faction: FactionId,
        units: &[UnitId],
        role: GroupRole,
        target: Option<Vec2>,
        index: &WorldIndex<'_>,
    ) -> Option<GroupId> {
        let mut seen = AHashSet::new();
        let members: Vec<UnitId> = units
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| index.unit(*id).is_some_and(|u| u.faction == faction))
            .take(self.config.max_group_size)
            .collect();
        if members.is_empty() {
            return None;
        }

        for group in self.groups.values_mut() {
            group.members.retain(|m| !members.contains(&m.unit));
        }
        self.groups.retain(|_, g| !g.members.is_empty());

        let anchor = target
            .or_else(|| Vec2::centroid(members.iter().filter_map(|id| index.unit(*id)).map(|u| u.position)))
            .unwrap_or(Vec2::ZERO);
        let shape = FormationShape {
            spacing: self.config.formation_spacing,
            scout_radius: self.config.scout_radius,
        };
        let formation = formation_offsets(role, members.len(), shape);
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let id = self.groups.insert_with_key(|id| CombatGroup {
            id,
            faction,
            role,
            members: members
                .iter()
                .enumerate()
                .map(|(slot, unit)| GroupMember { unit: *unit, slot })
                .collect(),
            target,
            anchor,
            formation,
            leader: members.first().copied(),
            sequence,
        });
        debug!(?id, ?faction, ?role, size = members.len(), "combat group formed");
        Some(id)
    }

    pub fn disband(&mut self, id: GroupId) -> Option<CombatGroup> {
        self.groups.remove(id)
    }

    pub fn group(&self, id: GroupId) -> Option<&CombatGroup> {
        self.groups.get(id)
    }

    /// Point the group at `target`; defenders re-anchor there as well
    pub fn set_target(&mut self, id: GroupId, target: Vec2) -> bool {
        match self.groups.get_mut(id) {
            Some(group) => {
                group.target = Some(target);
                group.anchor = target;
                true
            }
            None => false,
        }
    }

    /// Groups in creation order
    pub fn groups(&self) -> Vec<&CombatGroup> {
        let mut groups: Vec<&CombatGroup> = self.groups.values().collect();
        groups.sort_by_key(|g| g.sequence);
        groups
    }

    pub fn groups_of(&self, faction: FactionId) -> impl Iterator<Item = &CombatGroup> + '_ {
        self.groups.values().filter(move |g| g.faction == faction)
    }

    pub fn group_of(&self, unit: UnitId) -> Option<GroupId> {
        self.groups.values().find(|g| g.contains(unit)).map(|g| g.id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drop dead members and delete groups left empty
    pub fn prune(&mut self, index: &WorldIndex<'_>) {
        for group in self.groups.values_mut() {
            group.members.retain(|m| index.is_alive(m.unit));
            if group.leader.map_or(true, |l| !index.is_alive(l)) {
                group.leader = group.members.first().map(|m| m.unit);
            }
        }
        self.groups.retain(|id, g| {
            if g.members.is_empty() {
                debug!(?id, faction = ?g.faction, "combat group disbanded");
            }
            !g.members.is_empty()
        });
    }

    /// Propose this tick's commands for every group
    pub fn update(&mut self, index: &WorldIndex<'_>, map_center: Vec2, proposals: &mut ProposalBuffer) {
        self.prune(index);

        let mut order: Vec<&CombatGroup> = self.groups.values().collect();
        order.sort_by_key(|g| (g.role.update_rank(), g.sequence));

        for group in order {
            match group.role {
                GroupRole::Attack => self.update_attack(group, index, proposals),
                GroupRole::Defend => self.update_defend(group, index, proposals),
                GroupRole::Scout => self.update_scout(group, map_center, proposals),
                GroupRole::Raid => self.update_raid(group, index, proposals),
            }
        }
    }

    /// Everyone fires at the enemy nearest the target
    fn update_attack(&self, group: &CombatGroup, index: &WorldIndex<'_>, proposals: &mut ProposalBuffer) {
        let focus = group.target.unwrap_or(group.anchor);
        let source = ProposalSource::Group(group.id);

        if let Some(enemy) = nearest_enemy(index, group.faction, focus) {
            for member in &group.members {
                proposals.propose(member.unit, Order::attack(enemy.id), CommandPriority::High, source);
            }
            return;
        }

        let building = index
            .view
            .hostile_buildings(group.faction)
            .min_by(|a, b| a.position.distance(&focus).total_cmp(&b.position.distance(&focus)));
        if let Some(building) = building {
            for member in &group.members {
                proposals.propose(
                    member.unit,
                    Order::attack_building(building.id),
                    CommandPriority::High,
                    source,
                );
            }
            return;
        }

        self.hold_formation(group, focus, index, proposals);
    }

    fn update_defend(&self, group: &CombatGroup, index: &WorldIndex<'_>, proposals: &mut ProposalBuffer) {
        self.hold_formation(group, group.anchor, index, proposals);

        let mut intruders: Vec<&Unit> = index
            .view
            .hostile_units(group.faction)
            .filter(|e| e.position.distance(&group.anchor) <= self.config.defend_engage_radius)
            .collect();
        intruders.sort_by(|a, b| {
            a.position
                .distance(&group.anchor)
                .total_cmp(&b.position.distance(&group.anchor))
        });

        let defenders: Vec<&Unit> = group
            .member_ids()
            .filter_map(|id| index.unit(id))
            .filter(|u| u.can_fight())
            .collect();
        let mut committed: AHashSet<UnitId> = AHashSet::new();

        for intruder in intruders {
            let pick = |skip: &AHashSet<UnitId>| {
                defenders
                    .iter()
                    .filter(|d| !skip.contains(&d.id))
                    .min_by(|a, b| {
                        a.position
                            .distance(&intruder.position)
                            .total_cmp(&b.position.distance(&intruder.position))
                    })
                    .copied()
            };
            let Some(defender) = pick(&committed).or_else(|| pick(&AHashSet::new())) else {
                break;
            };
            committed.insert(defender.id);
            proposals.propose(
                defender.id,
                Order::attack(intruder.id),
                CommandPriority::High,
                ProposalSource::Group(group.id),
            );
        }
    }

    fn update_scout(&self, group: &CombatGroup, map_center: Vec2, proposals: &mut ProposalBuffer) {
        let center = group.target.unwrap_or(map_center);
        for member in &group.members {
            proposals.propose(
                member.unit,
                Order::patrol(group.slot_position(center, member)),
                CommandPriority::Normal,
                ProposalSource::Group(group.id),
            );
        }
    }

    /// Concentrate on the first enemy with too few friends nearby
    fn update_raid(&self, group: &CombatGroup, index: &WorldIndex<'_>, proposals: &mut ProposalBuffer) {
        let focus = group.target.unwrap_or(group.anchor);
        let mut enemies: Vec<&Unit> = index.view.hostile_units(group.faction).collect();
        enemies.sort_by(|a, b| a.position.distance(&focus).total_cmp(&b.position.distance(&focus)));

        let isolated = enemies.iter().find(|enemy| {
            let allies = index
                .view
                .units
                .iter()
                .filter(|o| o.id != enemy.id && o.faction == enemy.faction && o.is_alive())
                .filter(|o| o.position.distance(&enemy.position) <= self.config.raid_isolation_radius)
                .count();
            allies < self.config.raid_isolation_allies
        });

        match isolated {
            Some(enemy) => {
                for member in &group.members {
                    proposals.propose(
                        member.unit,
                        Order::attack(enemy.id),
                        CommandPriority::High,
                        ProposalSource::Group(group.id),
                    );
                }
            }
            None => self.hold_formation(group, focus, index, proposals),
        }
    }

    /// Move members that drifted off their slot back into place
    fn hold_formation(&self, group: &CombatGroup, center: Vec2, index: &WorldIndex<'_>, proposals: &mut ProposalBuffer) {
        for member in &group.members {
            let Some(unit) = index.unit(member.unit) else {
                continue;
            };
            let slot = group.slot_position(center, member);
            if unit.position.distance(&slot) > self.config.defend_slot_tolerance {
                proposals.propose(
                    member.unit,
                    Order::move_to(slot),
                    CommandPriority::Normal,
                    ProposalSource::Group(group.id),
                );
            }
        }
    }
}

fn nearest_enemy<'a>(index: &WorldIndex<'a>, faction: FactionId, position: Vec2) -> Option<&'a Unit> {
    index.view.hostile_units(faction).min_by(|a, b| {
        a.position
            .distance(&position)
            .total_cmp(&b.position.distance(&position))
    })
}
