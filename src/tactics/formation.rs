//! Formation offsets per group role
//!
//! Offsets are relative to the group's anchor or target and computed once
//! when a group forms; members lost later keep their slot indices.

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

/// What a combat group is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Attack,
    Defend,
    Scout,
    Raid,
}

impl GroupRole {
    /// Update order within a tick: concentrated attacks first
    pub fn update_rank(&self) -> u8 {
        match self {
            GroupRole::Attack => 0,
            GroupRole::Defend => 1,
            GroupRole::Scout => 2,
            GroupRole::Raid => 3,
        }
    }
}

/// Shape parameters shared by every role
#[derive(Debug, Clone, Copy)]
pub struct FormationShape {
    pub spacing: f32,
    pub scout_radius: f32,
}

/// One offset per member
pub fn formation_offsets(role: GroupRole, count: usize, shape: FormationShape) -> Vec<Vec2> {
    match role {
        GroupRole::Attack => line(count, shape.spacing),
        GroupRole::Defend => arc(count, shape.spacing),
        GroupRole::Scout => circle(count, shape.scout_radius),
        GroupRole::Raid => columns(count, shape.spacing * 0.5),
    }
}

/// Two abreast, rows stepping back from the front
fn line(count: usize, spacing: f32) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let column = (i % 2) as f32 - 0.5;
            let row = (i / 2) as f32;
            Vec2::new(column * spacing, -row * spacing)
        })
        .collect()
}

/// Half circle in front of the anchor, wider for larger groups
fn arc(count: usize, spacing: f32) -> Vec<Vec2> {
    let radius = spacing * (1.0 + count as f32 * 0.5);
    (0..count)
        .map(|i| {
            let angle = PI * (i as f32 + 0.5) / count as f32;
            Vec2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn circle(count: usize, radius: f32) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32;
            Vec2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn columns(count: usize, spacing: f32) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let column = (i % 2) as f32 - 0.5;
            Vec2::new(column * spacing, -((i / 2) as f32) * spacing)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPE: FormationShape = FormationShape {
        spacing: 2.0,
        scout_radius: 8.0,
    };

    #[test]
    fn test_one_offset_per_member() {
        for role in [GroupRole::Attack, GroupRole::Defend, GroupRole::Scout, GroupRole::Raid] {
            assert_eq!(formation_offsets(role, 5, SHAPE).len(), 5);
            assert!(formation_offsets(role, 0, SHAPE).is_empty());
        }
    }

    #[test]
    fn test_attack_line_is_two_wide() {
        let offsets = formation_offsets(GroupRole::Attack, 4, SHAPE);
        assert_eq!(offsets[0], Vec2::new(-1.0, 0.0));
        assert_eq!(offsets[1], Vec2::new(1.0, 0.0));
        assert_eq!(offsets[2], Vec2::new(-1.0, -2.0));
    }

    #[test]
    fn test_defend_arc_grows_with_members() {
        let small = formation_offsets(GroupRole::Defend, 2, SHAPE);
        let large = formation_offsets(GroupRole::Defend, 8, SHAPE);
        assert!(large[0].length() > small[0].length());
        // Half circle: never behind the anchor
        assert!(large.iter().all(|o| o.y >= 0.0));
    }

    #[test]
    fn test_scout_circle_radius() {
        for offset in formation_offsets(GroupRole::Scout, 6, SHAPE) {
            assert!((offset.length() - 8.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_raid_is_tighter_than_attack() {
        let raid = formation_offsets(GroupRole::Raid, 6, SHAPE);
        let attack = formation_offsets(GroupRole::Attack, 6, SHAPE);
        assert!(raid[5].length() < attack[5].length());
    }
}
