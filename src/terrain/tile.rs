//! Terrain categories and tiles

use serde::{Deserialize, Serialize};

use crate::core::types::{Vec2, ZoneId};

/// Integer tile coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing a world position (tiles are centered on integer coordinates)
    pub fn from_position(position: Vec2) -> Self {
        Self {
            x: position.x.round() as i32,
            y: position.y.round() as i32,
        }
    }

    pub fn to_position(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// Chebyshev distance (king moves)
    pub fn chebyshev(&self, other: &Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn euclidean(&self, other: &Self) -> f32 {
        self.to_position().distance(&other.to_position())
    }

    /// The 8 surrounding coordinates
    pub fn neighbors(&self) -> [TileCoord; 8] {
        let (x, y) = (self.x, self.y);
        [
            TileCoord::new(x + 1, y),
            TileCoord::new(x - 1, y),
            TileCoord::new(x, y + 1),
            TileCoord::new(x, y - 1),
            TileCoord::new(x + 1, y + 1),
            TileCoord::new(x + 1, y - 1),
            TileCoord::new(x - 1, y + 1),
            TileCoord::new(x - 1, y - 1),
        ]
    }
}

/// Terrain category for a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TerrainCategory {
    #[default]
    Open,     // Normal movement
    Forest,   // Slow
    Water,    // Impassable
    Mountain, // Impassable high ground
    Road,     // Fast
}

impl TerrainCategory {
    /// Movement cost multiplier (1.0 = normal)
    pub fn movement_cost(&self) -> f32 {
        match self {
            TerrainCategory::Open => 1.0,
            TerrainCategory::Forest => 2.0,
            TerrainCategory::Road => 0.5,
            TerrainCategory::Water | TerrainCategory::Mountain => f32::INFINITY,
        }
    }

    pub fn is_passable(&self) -> bool {
        !matches!(self, TerrainCategory::Water | TerrainCategory::Mountain)
    }
}

/// One cell of the terrain grid, fixed after generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub coord: TileCoord,
    pub category: TerrainCategory,
    pub passable: bool,
    pub movement_cost: f32,
    /// Resource zone covering this tile, if any
    pub zone: Option<ZoneId>,
}

impl Tile {
    pub fn new(coord: TileCoord, category: TerrainCategory) -> Self {
        Self {
            coord,
            category,
            passable: category.is_passable(),
            movement_cost: category.movement_cost(),
            zone: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_rounds_to_nearest_tile() {
        assert_eq!(TileCoord::from_position(Vec2::new(2.4, 2.6)), TileCoord::new(2, 3));
    }

    #[test]
    fn test_impassable_categories() {
        assert!(!Tile::new(TileCoord::new(0, 0), TerrainCategory::Water).passable);
        assert!(!Tile::new(TileCoord::new(0, 0), TerrainCategory::Mountain).passable);
        assert!(Tile::new(TileCoord::new(0, 0), TerrainCategory::Forest).passable);
        assert_eq!(TerrainCategory::Road.movement_cost(), 0.5);
    }
}
