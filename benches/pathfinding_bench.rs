use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strategos::core::config::{PathConfig, TerrainConfig};
use strategos::core::types::{FactionId, Vec2};
use strategos::terrain::{find_path, find_path_with, ObstacleMap, PathOptions, TerrainCategory, TerrainGrid};
use strategos::world::{UnitKind, World};

/// Open map with a long wall that forces a detour
fn walled_grid(size: u32) -> TerrainGrid {
    TerrainGrid::from_fn(size, size, |c| {
        if c.x == (size / 2) as i32 && c.y < (size - 4) as i32 {
            TerrainCategory::Mountain
        } else {
            TerrainCategory::Open
        }
    })
}

fn bench_pathfinding(c: &mut Criterion) {
    let options = PathOptions::from_config(&PathConfig::default());
    let mut group = c.benchmark_group("strategos/pathfinding");

    let open = TerrainGrid::open(128, 128);
    group.bench_function("open_diagonal", |b| {
        b.iter(|| {
            let path = find_path(&open, Vec2::new(1.5, 1.5), Vec2::new(126.5, 126.5), &[], &[], &options);
            black_box(path.len());
        })
    });

    let walled = walled_grid(96);
    let obstacles = ObstacleMap::build(&[], &[], &options);
    group.bench_function("wall_detour", |b| {
        b.iter(|| {
            let path = find_path_with(
                &walled,
                Vec2::new(4.5, 10.5),
                Vec2::new(90.5, 10.5),
                &obstacles,
                options.max_search_nodes,
            );
            black_box(path.len());
        })
    });

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let generated = TerrainGrid::generate(&TerrainConfig::default(), &[Vec2::new(10.0, 10.0)], &mut rng);
    let mut world = World::new();
    for i in 0..200 {
        let x = 5.0 + (i % 20) as f32 * 4.3;
        let y = 5.0 + (i / 20) as f32 * 8.1;
        world.spawn_unit(FactionId((i % 2) as u8), UnitKind::Infantry, Vec2::new(x, y));
    }
    let snapshot = world.snapshot();
    group.bench_function("generated_crowded", |b| {
        b.iter(|| {
            let path = find_path(
                &generated,
                Vec2::new(10.0, 10.0),
                Vec2::new(85.0, 85.0),
                &snapshot.units,
                &snapshot.buildings,
                &options,
            );
            black_box(path.len());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_pathfinding);
criterion_main!(benches);
