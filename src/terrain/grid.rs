//! Terrain grid generation
//!
//! Smooth pseudo-noise (a few sine/cosine octaves with seeded phases) picks
//! each tile's category. Spawn neighborhoods are always cleared so every
//! faction starts on buildable ground.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::TerrainConfig;
use crate::core::types::{Vec2, ZoneId};
use crate::terrain::tile::{TerrainCategory, Tile, TileCoord};

const OCTAVES: usize = 3;

/// Fixed-size grid of tiles
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TerrainGrid {
    /// Build a grid whose category at each coordinate comes from `category_at`
    pub fn from_fn(width: u32, height: u32, mut category_at: impl FnMut(TileCoord) -> TerrainCategory) -> Self {
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let coord = TileCoord::new(x, y);
                tiles.push(Tile::new(coord, category_at(coord)));
            }
        }
        Self { width, height, tiles }
    }

    /// All-open grid
    pub fn open(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_| TerrainCategory::Open)
    }

    /// Generate terrain from noise, clearing the area around each spawn point
    pub fn generate(config: &TerrainConfig, spawns: &[Vec2], rng: &mut ChaCha8Rng) -> Self {
        let phases: [f32; OCTAVES * 2] =
            std::array::from_fn(|_| rng.gen_range(0.0..std::f32::consts::TAU));

        let center = Vec2::new(config.width as f32 / 2.0, config.height as f32 / 2.0);
        let half_extent = config.width.min(config.height) as f32 / 2.0;
        let water_clearance = half_extent * config.water_center_clearance;

        let grid = Self::from_fn(config.width, config.height, |coord| {
            let position = coord.to_position();
            if spawns
                .iter()
                .any(|s| s.distance(&position) <= config.spawn_clear_radius)
            {
                return TerrainCategory::Open;
            }

            let noise = terrain_noise(position, &phases);
            if noise > config.mountain_threshold {
                TerrainCategory::Mountain
            } else if noise < config.water_threshold && position.distance(&center) > water_clearance {
                TerrainCategory::Water
            } else if noise > config.forest_threshold {
                TerrainCategory::Forest
            } else if rng.gen::<f32>() < config.road_chance {
                TerrainCategory::Road
            } else {
                TerrainCategory::Open
            }
        });

        tracing::debug!(
            width = config.width,
            height = config.height,
            passable = grid.tiles.iter().filter(|t| t.passable).count(),
            "terrain generated"
        );
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width as i32 && coord.y < self.height as i32
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        if !self.in_bounds(coord) {
            return None;
        }
        self.tiles.get(coord.y as usize * self.width as usize + coord.x as usize)
    }

    pub fn tile_at(&self, position: Vec2) -> Option<&Tile> {
        self.tile(TileCoord::from_position(position))
    }

    pub fn is_passable(&self, coord: TileCoord) -> bool {
        self.tile(coord).is_some_and(|t| t.passable)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.width.saturating_sub(1)) as f32 / 2.0,
            (self.height.saturating_sub(1)) as f32 / 2.0,
        )
    }

    /// Clamp a position into the grid
    pub fn clamp(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position.x.clamp(0.0, self.width.saturating_sub(1) as f32),
            position.y.clamp(0.0, self.height.saturating_sub(1) as f32),
        )
    }

    /// Record that the tiles within `radius` of `center` belong to a zone.
    /// Only called while the map is being generated.
    pub(crate) fn link_zone(&mut self, zone: ZoneId, center: Vec2, radius: f32) {
        for tile in self.tiles.iter_mut() {
            if tile.zone.is_none() && tile.coord.to_position().distance(&center) <= radius {
                tile.zone = Some(zone);
            }
        }
    }
}

/// Sum of sine/cosine octaves at increasing frequency, normalised to -1..=1
fn terrain_noise(position: Vec2, phases: &[f32; OCTAVES * 2]) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 0.06;
    let mut norm = 0.0;

    for octave in 0..OCTAVES {
        let sx = (position.x * frequency + phases[octave * 2]).sin();
        let cy = (position.y * frequency + phases[octave * 2 + 1]).cos();
        let diagonal = ((position.x + position.y) * frequency * 0.7 + phases[octave * 2]).sin();
        value += amplitude * (sx * cy * 0.75 + diagonal * 0.25);
        norm += amplitude;
        amplitude *= 0.5;
        frequency *= 2.1;
    }

    value / norm
}
