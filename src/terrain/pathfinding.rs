//! A* pathfinding over the terrain grid
//!
//! Respects terrain costs, building footprints and (softly) other units.
//! When no route exists the search degrades to a direct two-point path
//! instead of failing; callers must tolerate that path crossing obstacles.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;

use crate::core::config::PathConfig;
use crate::core::types::{BuildingId, UnitId, Vec2};
use crate::terrain::grid::TerrainGrid;
use crate::terrain::tile::TileCoord;
use crate::world::{Building, Unit};

/// Node in the A* open set
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathNode {
    coord: TileCoord,
    f_cost: OrderedFloat<f32>, // g_cost + heuristic
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap, coordinate breaks ties deterministically
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-request options
#[derive(Debug, Clone, Copy, Default)]
pub struct PathOptions {
    /// The moving unit, which never blocks itself
    pub mover: Option<UnitId>,
    /// A building the path is heading for, whose footprint is not an obstacle
    pub destination_building: Option<BuildingId>,
    pub unit_tolerance: f32,
    pub max_search_nodes: usize,
}

impl PathOptions {
    pub fn from_config(config: &PathConfig) -> Self {
        Self {
            mover: None,
            destination_building: None,
            unit_tolerance: config.unit_tolerance,
            max_search_nodes: config.max_search_nodes,
        }
    }

    pub fn for_unit(mut self, unit: UnitId) -> Self {
        self.mover = Some(unit);
        self
    }

    pub fn toward_building(mut self, building: Option<BuildingId>) -> Self {
        self.destination_building = building;
        self
    }
}

/// Tiles blocked by live units and building footprints for one search
#[derive(Debug, Default)]
pub struct ObstacleMap {
    blocked: AHashSet<TileCoord>,
}

impl ObstacleMap {
    pub fn build(units: &[Unit], buildings: &[Building], options: &PathOptions) -> Self {
        let mut blocked = AHashSet::new();

        for unit in units {
            if Some(unit.id) == options.mover || !unit.is_alive() {
                continue;
            }
            let coord = TileCoord::from_position(unit.position);
            if coord.to_position().distance(&unit.position) <= options.unit_tolerance {
                blocked.insert(coord);
            }
        }

        for building in buildings {
            if Some(building.id) == options.destination_building {
                continue;
            }
            let radius = building.kind.stats().footprint_radius;
            let reach = radius.ceil() as i32;
            let center = TileCoord::from_position(building.position);
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let coord = TileCoord::new(center.x + dx, center.y + dy);
                    if coord.to_position().distance(&building.position) <= radius {
                        blocked.insert(coord);
                    }
                }
            }
        }

        Self { blocked }
    }

    pub fn is_blocked(&self, coord: TileCoord) -> bool {
        self.blocked.contains(&coord)
    }
}

/// Find a path from `start` to `goal` among live units and buildings.
///
/// The first point is `start`, the last is `goal`; intermediate points are
/// tile centers. Falls back to `[start, goal]` when no route is found
/// within the search budget.
pub fn find_path(
    grid: &TerrainGrid,
    start: Vec2,
    goal: Vec2,
    units: &[Unit],
    buildings: &[Building],
    options: &PathOptions,
) -> Vec<Vec2> {
    let obstacles = ObstacleMap::build(units, buildings, options);
    find_path_with(grid, start, goal, &obstacles, options.max_search_nodes)
}

/// A* with a prebuilt obstacle map
pub fn find_path_with(
    grid: &TerrainGrid,
    start: Vec2,
    goal: Vec2,
    obstacles: &ObstacleMap,
    max_search_nodes: usize,
) -> Vec<Vec2> {
    let start_coord = TileCoord::from_position(start);
    let goal_coord = TileCoord::from_position(goal);

    if !grid.in_bounds(goal_coord) || !grid.in_bounds(start_coord) {
        return vec![start, goal];
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<TileCoord, TileCoord> = AHashMap::new();
    let mut g_scores: AHashMap<TileCoord, f32> = AHashMap::new();
    let mut closed: AHashSet<TileCoord> = AHashSet::new();

    g_scores.insert(start_coord, 0.0);
    open_set.push(PathNode {
        coord: start_coord,
        f_cost: OrderedFloat(start_coord.euclidean(&goal_coord)),
    });

    while let Some(current) = open_set.pop() {
        if !closed.insert(current.coord) {
            continue;
        }

        if current.coord.chebyshev(&goal_coord) <= 1 {
            let tiles = reconstruct_path(&came_from, current.coord);
            return finish_path(tiles, start, goal, goal_coord);
        }

        if closed.len() > max_search_nodes {
            tracing::trace!(?start, ?goal, "path search budget exhausted");
            break;
        }

        let current_g = *g_scores.get(&current.coord).unwrap_or(&f32::INFINITY);

        for neighbor in current.coord.neighbors() {
            if closed.contains(&neighbor) {
                continue;
            }
            let Some(tile) = grid.tile(neighbor) else {
                continue;
            };
            if !tile.passable || obstacles.is_blocked(neighbor) {
                continue;
            }

            let diagonal = neighbor.x != current.coord.x && neighbor.y != current.coord.y;
            if diagonal && cuts_corner(grid, current.coord, neighbor) {
                continue;
            }

            let step = if diagonal { std::f32::consts::SQRT_2 } else { 1.0 };
            let tentative_g = current_g + tile.movement_cost * step;
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);

                let f_cost = tentative_g + neighbor.euclidean(&goal_coord);
                open_set.push(PathNode {
                    coord: neighbor,
                    f_cost: OrderedFloat(f_cost),
                });
            }
        }
    }

    tracing::trace!(?start, ?goal, "no route found, using direct path");
    vec![start, goal]
}

/// Diagonal moves may not squeeze between two impassable orthogonal tiles
fn cuts_corner(grid: &TerrainGrid, from: TileCoord, to: TileCoord) -> bool {
    !grid.is_passable(TileCoord::new(to.x, from.y)) || !grid.is_passable(TileCoord::new(from.x, to.y))
}

/// Reconstruct tile sequence from came_from map
fn reconstruct_path(came_from: &AHashMap<TileCoord, TileCoord>, mut current: TileCoord) -> Vec<TileCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Swap the start tile for the exact start and end on the exact goal
fn finish_path(tiles: Vec<TileCoord>, start: Vec2, goal: Vec2, goal_coord: TileCoord) -> Vec<Vec2> {
    let mut path: Vec<Vec2> = Vec::with_capacity(tiles.len() + 1);
    path.push(start);
    for coord in tiles.iter().skip(1) {
        if *coord != goal_coord {
            path.push(coord.to_position());
        }
    }
    path.push(goal);
    path
}

/// Sum of movement costs of the tiles a path visits
pub fn path_cost(grid: &TerrainGrid, path: &[Vec2]) -> f32 {
    path.iter()
        .filter_map(|p| grid.tile_at(*p))
        .map(|tile| tile.movement_cost)
        .sum()
}
