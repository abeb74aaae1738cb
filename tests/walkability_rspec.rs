//! Behavioural tests comparing cached walkability answers with direct
//! physics queries over the same obstacle layout.

use std::sync::{Arc, Mutex, PoisonError};

use approx::assert_relative_eq;
use glam::Vec3;
use strider::walkability::{check_walkability_uncached, walk_region};
use strider::{Aabb, WalkabilityCacheManager};
use test_utils::{assert_reports_agree, BoxWorld};

const ACTOR: u32 = 1;
const RADIUS: f32 = 0.4;

#[derive(Debug)]
struct Scene {
    world: BoxWorld,
    manager: WalkabilityCacheManager<u32>,
}

impl Scene {
    fn new() -> Self {
        let mut world = BoxWorld::with_ground();
        world.add_pillar(Vec3::new(1.5, 2.0, 0.0), 0.4, 2.0);
        world.add_platform((5.0, -1.0), (7.0, 1.0), 0.1);
        let mut manager = WalkabilityCacheManager::default();
        manager.enable_actor(ACTOR, true);
        Self { world, manager }
    }
}

#[derive(Clone, Debug)]
struct Env {
    scene: Arc<Mutex<Scene>>,
}

impl Default for Env {
    fn default() -> Self {
        Self {
            scene: Arc::new(Mutex::new(Scene::new())),
        }
    }
}

impl Env {
    fn with_scene<R>(&self, f: impl FnOnce(&mut Scene) -> R) -> R {
        let mut scene = self.scene.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut scene)
    }

    fn rebuild_and_prepare(&self) {
        self.with_scene(|scene| {
            *scene = Scene::new();
            scene.manager.pre_update();
            let area = Aabb::new(Vec3::new(-1.0, -1.0, -1.5), Vec3::new(8.0, 5.0, 1.5));
            assert!(scene.manager.prepare_actor(ACTOR, &area, &scene.world));
        });
    }
}

fn targets() -> [Vec3; 4] {
    [
        Vec3::new(4.0, 0.0, 0.0),
        Vec3::new(3.0, 4.0, 0.0),
        Vec3::new(6.0, 0.0, 0.0),
        Vec3::new(60.0, 0.0, 0.0),
    ]
}

#[test]
fn prepared_actor_agrees_with_direct_queries() {
    rspec::run(&rspec::given(
        "an actor prepared over a yard with a pillar and a low step",
        Env::default(),
        |ctx| {
            ctx.before_each(|env| env.rebuild_and_prepare());

            ctx.then("the prepared cache covers nearby walks", |env| {
                env.with_scene(|scene| {
                    let config = *scene.manager.config();
                    let cache = scene.manager.cache(ACTOR);
                    let needed = walk_region(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), RADIUS, &config);
                    assert!(cache.is_some_and(|prepared| prepared.covers(&needed)));
                });
            });

            ctx.then("cached and direct answers match", |env| {
                env.with_scene(|scene| {
                    let config = *scene.manager.config();
                    for target in targets() {
                        let cached =
                            scene
                                .manager
                                .check_walkability(ACTOR, Vec3::ZERO, target, RADIUS, &scene.world);
                        let direct = check_walkability_uncached(
                            &scene.world,
                            &config,
                            Vec3::ZERO,
                            target,
                            RADIUS,
                            None,
                        );
                        assert_reports_agree(&cached, &direct);
                    }
                });
            });

            ctx.then("each layout feature shapes the answer", |env| {
                env.with_scene(|scene| {
                    let mut check = |target: Vec3| {
                        scene
                            .manager
                            .check_walkability(ACTOR, Vec3::ZERO, target, RADIUS, &scene.world)
                    };
                    let open = check(Vec3::new(4.0, 0.0, 0.0));
                    assert!(open.walkable && open.flat_floor);
                    assert!(!check(Vec3::new(3.0, 4.0, 0.0)).walkable);
                    let step = check(Vec3::new(6.0, 0.0, 0.0));
                    assert!(step.walkable && !step.flat_floor);
                    assert_relative_eq!(step.final_floor.unwrap_or(f32::NAN), 0.1);
                    assert!(!check(Vec3::new(60.0, 0.0, 0.0)).walkable);
                });
            });

            ctx.then("a covered walk issues no overlap query", |env| {
                env.with_scene(|scene| {
                    scene.world.reset_counters();
                    let report = scene.manager.check_walkability(
                        ACTOR,
                        Vec3::ZERO,
                        Vec3::new(4.0, 0.0, 0.0),
                        RADIUS,
                        &scene.world,
                    );
                    assert!(report.walkable);
                    assert_eq!(scene.world.overlap_calls(), 0);
                    assert_eq!(scene.manager.stats().walkability_cache_hits, 1);
                });
            });
        },
    ));
}
