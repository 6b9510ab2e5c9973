//! Terrain grid and grid search

pub mod grid;
pub mod pathfinding;
pub mod tile;

pub use grid::TerrainGrid;
pub use pathfinding::{find_path, find_path_with, path_cost, ObstacleMap, PathOptions};
pub use tile::{TerrainCategory, Tile, TileCoord};
