//! Property tests for pathfinding and resource zones

use proptest::prelude::*;
use strategos::core::config::PathConfig;
use strategos::core::types::{UnitId, Vec2, ZoneId};
use strategos::resource::{ResourceCategory, ResourceZone, ResourceZoneAllocator};
use strategos::terrain::{find_path, PathOptions, TerrainCategory, TerrainGrid};
use strategos::world::{UnitKind, World};

const SIZE: i32 = 40;

fn options() -> PathOptions {
    PathOptions::from_config(&PathConfig::default())
}

fn tile() -> impl Strategy<Value = (i32, i32)> {
    (0..SIZE, 0..SIZE)
}

proptest! {
    #[test]
    fn open_grid_paths_are_bounded((ax, ay) in tile(), (bx, by) in tile()) {
        prop_assume!((ax, ay) != (bx, by));
        let grid = TerrainGrid::open(SIZE as u32, SIZE as u32);
        let a = Vec2::new(ax as f32, ay as f32);
        let b = Vec2::new(bx as f32, by as f32);

        let path = find_path(&grid, a, b, &[], &[], &options());

        prop_assert_eq!(path[0], a);
        prop_assert!(path[path.len() - 1].distance(&b) < 1e-4);
        let dx = (ax - bx).unsigned_abs() as usize;
        let dy = (ay - by).unsigned_abs() as usize;
        let steps = path.len() - 1;
        prop_assert!(steps >= dx.max(dy), "{} steps for ({}, {})", steps, dx, dy);
        prop_assert!(steps <= dx + dy, "{} steps for ({}, {})", steps, dx, dy);
    }

    #[test]
    fn walled_off_goal_falls_back_to_direct_line(ay in 0..SIZE, by in 0..SIZE, wall in 5..SIZE - 5) {
        let grid = TerrainGrid::from_fn(SIZE as u32, SIZE as u32, |c| {
            if c.x == wall { TerrainCategory::Water } else { TerrainCategory::Open }
        });
        let a = Vec2::new(1.0, ay as f32);
        let b = Vec2::new((SIZE - 2) as f32, by as f32);

        let path = find_path(&grid, a, b, &[], &[], &options());
        prop_assert_eq!(path, vec![a, b]);
    }

    #[test]
    fn zone_remaining_never_negative(
        amount in 0.0f32..500.0,
        rate in 0.1f32..50.0,
        workers in 1usize..5,
        ticks in prop::collection::vec(1u64..2_000, 1..60),
    ) {
        let mut world = World::new();
        let ids: Vec<UnitId> = (0..workers)
            .map(|_| world.spawn_unit(strategos::core::types::FactionId(0), UnitKind::Engineer, Vec2::new(3.0, 3.0)))
            .collect();
        let zone = ResourceZone::new(ZoneId(0), ResourceCategory::Steel, Vec2::new(3.0, 3.0), 2.0, amount, 4);
        let mut zones = ResourceZoneAllocator::from_zones(vec![zone], rate);
        for id in &ids {
            zones.assign(ZoneId(0), *id);
        }

        let mut gathered = 0.0;
        for delta in ticks {
            gathered += zones.extract(delta).iter().map(|e| e.amount).sum::<f32>();
            let zone = zones.zone(ZoneId(0)).unwrap();
            prop_assert!(zone.remaining >= 0.0);
            prop_assert!(zone.workers.len() <= zone.max_workers);
            if zone.exhausted {
                prop_assert!(zone.workers.is_empty());
            }
        }
        prop_assert!(gathered <= amount + 1e-2);
    }
}
