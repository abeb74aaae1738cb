//! Walkability cache and manager behaviour against a mocked physics backend.
//!
//! The mock counts exactly how often physics is consulted, which is what the
//! caches exist to reduce.

use glam::Vec3;
use mockall::mock;
use rstest::rstest;
use strider::{
    Aabb, CacheOutcome, Obstacle, PhysicsError, PhysicsQuery, WalkabilityCache,
    WalkabilityCacheManager, WalkabilityConfig, WalkabilityReport,
};

mock! {
    pub Physics {}
    impl PhysicsQuery for Physics {
        fn overlap(&self, region: &Aabb) -> Result<Vec<Obstacle>, PhysicsError>;
        fn find_floor(
            &self,
            position: Vec3,
            search_radius: f32,
            search_height: f32,
            candidates: &[Obstacle],
        ) -> Option<f32>;
        fn capsule_overlaps(&self, start: Vec3, end: Vec3, radius: f32, candidates: &[Obstacle]) -> bool;
    }
}

fn ground() -> Obstacle {
    Obstacle::new(1_u64, Aabb::new(Vec3::new(-50.0, -50.0, -1.0), Vec3::new(50.0, 50.0, 0.0)))
}

fn unit_region() -> Aabb {
    Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
}

#[rstest]
fn covered_region_queries_physics_once() {
    let mut physics = MockPhysics::new();
    physics
        .expect_overlap()
        .times(1)
        .returning(|_| Ok(vec![ground()]));

    let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
    let first = cache.cache(&unit_region(), &physics);
    assert_eq!(first, CacheOutcome::Refreshed { floor_preserved: false });
    let inner = Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5));
    assert_eq!(cache.cache(&inner, &physics), CacheOutcome::Hit);
    assert_eq!(cache.obstacles(), [ground()].as_slice());
}

#[rstest]
fn cached_region_is_grown_by_margin() {
    let mut physics = MockPhysics::new();
    physics
        .expect_overlap()
        .withf(|region| region.min.x <= -3.0 && region.max.z >= 2.0)
        .times(1)
        .returning(|_| Ok(Vec::new()));

    let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
    assert!(cache.cache(&unit_region(), &physics).is_cached());
    assert!(cache.region().is_some_and(|region| region.contains(&unit_region())));
}

#[rstest]
fn overflow_leaves_cache_empty() {
    let config = WalkabilityConfig {
        obstacle_capacity: 2,
        ..WalkabilityConfig::default()
    };
    let mut physics = MockPhysics::new();
    physics.expect_overlap().times(1).returning(|_| {
        Ok((1_u64..=3)
            .map(|id| Obstacle::new(id, Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5))))
            .collect())
    });

    let mut cache = WalkabilityCache::new(config);
    assert_eq!(cache.cache(&unit_region(), &physics), CacheOutcome::Failed);
    assert!(cache.obstacles().is_empty());
    assert_eq!(cache.region(), None);
}

#[rstest]
fn floor_is_probed_once_per_cell() {
    let mut physics = MockPhysics::new();
    physics
        .expect_overlap()
        .times(1)
        .returning(|_| Ok(vec![ground()]));
    physics
        .expect_find_floor()
        .times(1)
        .returning(|_, _, _, _| Some(0.0));

    let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
    assert_eq!(cache.find_floor(Vec3::new(0.1, 0.1, 0.0), &physics), Some(0.0));
    assert_eq!(cache.find_floor(Vec3::new(0.2, 0.2, 0.0), &physics), Some(0.0));
    assert!(cache.is_floor_cached(Vec3::new(0.15, 0.15, 0.0)).is_some());
}

#[rstest]
fn failing_physics_blocks_the_walk() {
    let mut physics = MockPhysics::new();
    physics
        .expect_overlap()
        .times(2)
        .returning(|_| Err(PhysicsError::Unavailable));
    physics.expect_find_floor().never();
    physics.expect_capsule_overlaps().never();

    let mut manager = WalkabilityCacheManager::<u32>::default();
    manager.enable_actor(7, true);
    manager.pre_update();
    let report = manager.check_walkability(7, Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), 0.4, &physics);
    assert_eq!(report, WalkabilityReport::BLOCKED);
}

#[rstest]
fn unknown_actor_never_reaches_physics() {
    let mut physics = MockPhysics::new();
    physics.expect_overlap().never();
    physics.expect_find_floor().never();

    let mut manager = WalkabilityCacheManager::<u32>::default();
    manager.pre_update();
    assert_eq!(manager.find_floor(3, Vec3::ZERO, &physics), None);
    assert!(!manager.check_walkability(3, Vec3::ZERO, Vec3::X, 0.4, &physics).walkable);
}

#[rstest]
fn blocked_sweep_fails_the_walk() {
    let mut physics = MockPhysics::new();
    physics
        .expect_overlap()
        .times(1)
        .returning(|_| {
            let crate_box = Aabb::from_center(Vec3::new(1.0, 0.0, 1.0), Vec3::splat(0.5));
            Ok(vec![ground(), Obstacle::new(2_u64, crate_box)])
        });
    physics.expect_find_floor().returning(|_, _, _, _| Some(0.0));
    physics
        .expect_capsule_overlaps()
        .returning(|_, _, _, candidates| candidates.iter().any(|o| o.id.0 == 2));

    let mut manager = WalkabilityCacheManager::<u32>::default();
    manager.enable_actor(1, true);
    manager.pre_update();
    let report = manager.check_walkability(1, Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), 0.4, &physics);
    assert!(!report.walkable);
}
