//! Walks over terrain that leaves the region first requested for the walk.

use glam::Vec3;
use rstest::{fixture, rstest};
use strider::walkability::{check_walkability_uncached, walk_region};
use strider::{Aabb, WalkabilityCache, WalkabilityCacheManager, WalkabilityConfig};
use test_utils::{assert_reports_agree, BoxWorld};

const RADIUS: f32 = 0.4;

/// Landing at `z = 0` for `x < 1`, five one-metre treads each half a metre
/// lower, then a floor at `z = -3`.
#[fixture]
fn staircase() -> BoxWorld {
    let mut world = BoxWorld::new();
    world.add_box(Vec3::new(-10.0, -10.0, -1.0), Vec3::new(1.0, 10.0, 0.0));
    for tread in 1_u8..=5 {
        let x = f32::from(tread);
        let top = -0.5 * x;
        world.add_box(Vec3::new(x, -10.0, top - 0.5), Vec3::new(x + 1.0, 10.0, top));
    }
    world.add_box(Vec3::new(6.0, -10.0, -4.0), Vec3::new(20.0, 10.0, -3.0));
    world
}

fn down_the_stairs() -> (Vec3, Vec3) {
    (Vec3::ZERO, Vec3::new(5.5, 0.0, 0.0))
}

#[rstest]
fn descent_below_walk_region_is_walkable_both_ways(staircase: BoxWorld) {
    let config = WalkabilityConfig::default();
    let (origin, target) = down_the_stairs();
    let lowest_tread = -2.5;
    assert!(walk_region(origin, target, RADIUS, &config).min.z > lowest_tread);

    let direct = check_walkability_uncached(&staircase, &config, origin, target, RADIUS, None);
    let mut cache = WalkabilityCache::new(config);
    let cached = cache.check_walkability(origin, target, RADIUS, &staircase);

    assert!(direct.walkable);
    assert_eq!(direct.final_floor, Some(lowest_tread));
    assert!(!direct.flat_floor);
    assert_reports_agree(&cached, &direct);
}

#[rstest]
fn descending_walk_keeps_prepared_obstacles(staircase: BoxWorld) {
    let (origin, target) = down_the_stairs();
    let mut manager = WalkabilityCacheManager::<u32>::default();
    manager.enable_actor(1, true);
    manager.pre_update();
    let prepared = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(7.0, 1.0, 2.0));
    assert!(manager.prepare_actor(1, &prepared, &staircase));

    let report = manager.check_walkability(1, origin, target, RADIUS, &staircase);
    let direct = check_walkability_uncached(
        &staircase,
        manager.config(),
        origin,
        target,
        RADIUS,
        None,
    );
    assert_reports_agree(&report, &direct);

    let cache = manager.cache(1);
    assert!(cache.is_some_and(|kept| kept.covers(&prepared)));
    assert!(cache.is_some_and(|kept| kept.obstacles().len() == staircase.obstacles().len()));
}

#[rstest]
fn growing_past_capacity_redoes_the_walk_uncached(staircase: BoxWorld) {
    let config = WalkabilityConfig {
        obstacle_capacity: 5,
        cache_margin: Vec3::ZERO,
        ..WalkabilityConfig::default()
    };
    let (origin, target) = down_the_stairs();
    let mut cache = WalkabilityCache::new(config);
    let cached = cache.check_walkability(origin, target, RADIUS, &staircase);
    let direct = check_walkability_uncached(&staircase, &config, origin, target, RADIUS, None);
    assert_reports_agree(&cached, &direct);
    assert!(cached.walkable);
}
