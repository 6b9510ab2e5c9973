//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use uuid::Uuid;

new_key_type! {
    /// Generation-checked handle to a unit owned by the world-state collaborator
    pub struct UnitId;
    /// Generation-checked handle to a building owned by the world-state collaborator
    pub struct BuildingId;
    /// Handle to a combat group owned by the group manager
    pub struct GroupId;
}

/// Simulated clock, in milliseconds since match start
pub type TimeMs = u64;

/// Faction (player or AI side) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub u8);

/// Index of a resource zone; zones are never removed, only exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// Unique identifier for unit commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub Uuid);

impl CommandId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

/// 2D position in tile units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    /// Linear interpolation toward `other` (t = 0 gives self)
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Move toward `target` by at most `max_step`, landing exactly on it if closer
    pub fn step_toward(&self, target: &Self, max_step: f32) -> Self {
        let remaining = self.distance(target);
        if remaining <= max_step || remaining <= f32::EPSILON {
            *target
        } else {
            *self + (*target - *self).normalize() * max_step
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Arithmetic mean of a set of points, None when empty
    pub fn centroid<I: IntoIterator<Item = Vec2>>(points: I) -> Option<Vec2> {
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;
        for p in points {
            sum = sum + p;
            count += 1;
        }
        (count > 0).then(|| sum * (1.0 / count as f32))
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}
