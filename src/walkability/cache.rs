//! Per-actor cache of nearby obstacles and memoised floor heights.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::mem;

use glam::{Vec2, Vec3};
use log::{debug, trace, warn};

use super::{
    check_walkability_uncached, find_floor_uncached, floor_probe_region, probe_floor, walk,
    walk_region, WalkSurface, WalkabilityReport,
};
use crate::config::WalkabilityConfig;
use crate::floor_cache::{FloorHeightCache, FloorSample};
use crate::geometry::Aabb;
use crate::physics::{Obstacle, PhysicsQuery};

/// Result of asking a cache to cover a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The cached region already contained the request. No physics query ran.
    Hit,
    /// The obstacle list was rebuilt from a fresh overlap query.
    Refreshed {
        /// True when the new obstacle set hashed equal to the one the floor
        /// memo was built against, so floor entries were kept.
        floor_preserved: bool,
    },
    /// The overlap query failed or exceeded capacity. The cache is empty.
    Failed,
}

impl CacheOutcome {
    /// True when the cache now covers the requested region.
    #[must_use]
    pub const fn is_cached(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Obstacles and floor heights around one actor.
///
/// The obstacle list is bounded by [`WalkabilityConfig::obstacle_capacity`].
/// Floor entries are only trusted for the obstacle set they were probed
/// against; a refresh that changes the set clears them.
#[derive(Debug, Clone)]
pub struct WalkabilityCache {
    config: WalkabilityConfig,
    region: Option<Aabb>,
    obstacles: Vec<Obstacle>,
    content_hash: Option<u64>,
    floor: FloorHeightCache,
    floor_hash: Option<u64>,
    scratch: Vec<Obstacle>,
}

impl WalkabilityCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(config: WalkabilityConfig) -> Self {
        Self {
            config,
            region: None,
            obstacles: Vec::new(),
            content_hash: None,
            floor: FloorHeightCache::new(),
            floor_hash: None,
            scratch: Vec::new(),
        }
    }

    /// Forgets the cached region and obstacles, and the floor memo when
    /// `reset_floor_also` is set.
    pub fn reset(&mut self, reset_floor_also: bool) {
        self.region = None;
        self.obstacles.clear();
        self.content_hash = None;
        if reset_floor_also {
            self.floor.reset();
            self.floor_hash = None;
        }
    }

    /// Region currently covered, if any.
    #[must_use]
    pub const fn region(&self) -> Option<Aabb> {
        self.region
    }

    /// Cached obstacles in the order physics reported them.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Order-independent hash of the cached obstacle set.
    #[must_use]
    pub const fn content_hash(&self) -> Option<u64> {
        self.content_hash
    }

    /// The embedded floor memo.
    #[must_use]
    pub const fn floor(&self) -> &FloorHeightCache {
        &self.floor
    }

    /// Settings this cache was created with.
    #[must_use]
    pub const fn config(&self) -> &WalkabilityConfig {
        &self.config
    }

    /// True when the cached region contains `region`.
    #[must_use]
    pub fn covers(&self, region: &Aabb) -> bool {
        self.region.is_some_and(|cached| cached.contains(region))
    }

    /// Ensures the obstacle list covers `region`.
    ///
    /// A miss queries physics over `region` grown by the configured margin,
    /// so nearby follow-up requests hit.
    pub fn cache<P: PhysicsQuery + ?Sized>(&mut self, region: &Aabb, physics: &P) -> CacheOutcome {
        if self.covers(region) {
            return CacheOutcome::Hit;
        }
        if !region.is_valid() {
            debug!("refusing to cache degenerate region {region:?}");
            return CacheOutcome::Failed;
        }
        self.refresh(region.expanded(self.config.cache_margin), physics)
    }

    /// Like [`Self::cache`], but a miss grows the cached region to the union
    /// of the old region and the request instead of replacing it.
    ///
    /// Walks use this so obstacles gathered for earlier samples stay
    /// available to later ones.
    pub(crate) fn extend<P: PhysicsQuery + ?Sized>(&mut self, region: &Aabb, physics: &P) -> CacheOutcome {
        if self.covers(region) {
            return CacheOutcome::Hit;
        }
        if !region.is_valid() {
            debug!("refusing to cache degenerate region {region:?}");
            return CacheOutcome::Failed;
        }
        let grown = region.expanded(self.config.cache_margin);
        let target = self.region.map_or(grown, |cached| cached.union(&grown));
        self.refresh(target, physics)
    }

    fn refresh<P: PhysicsQuery + ?Sized>(&mut self, expanded: Aabb, physics: &P) -> CacheOutcome {
        let found = match physics.overlap(&expanded) {
            Ok(found) => found,
            Err(err) => {
                debug!("walkability cache refresh failed: {err}");
                self.reset(true);
                return CacheOutcome::Failed;
            }
        };
        if found.len() > self.config.obstacle_capacity {
            warn!(
                "walkability cache overflow: {} obstacles exceed capacity {}",
                found.len(),
                self.config.obstacle_capacity
            );
            self.reset(true);
            return CacheOutcome::Failed;
        }

        let hash = content_hash(&found);
        let floor_preserved = self.floor_hash == Some(hash);
        if !floor_preserved {
            self.floor.reset();
            self.floor_hash = Some(hash);
        }
        trace!(
            "cached {} obstacles over {expanded:?} (floor preserved: {floor_preserved})",
            found.len()
        );
        self.obstacles = found;
        self.content_hash = Some(hash);
        self.region = Some(expanded);
        CacheOutcome::Refreshed { floor_preserved }
    }

    /// Copies the cached obstacles intersecting `region` into `out`.
    ///
    /// Only reflects what is cached; call [`Self::cache`] first.
    pub fn get_overlapping(&self, region: &Aabb, out: &mut Vec<Obstacle>) -> usize {
        out.clear();
        out.extend(
            self.obstacles
                .iter()
                .filter(|obstacle| obstacle.bounds.intersects(region)),
        );
        out.len()
    }

    /// Memoised floor for the cell containing `position`.
    #[must_use]
    pub fn is_floor_cached(&self, position: Vec3) -> Option<FloorSample> {
        self.floor.get_height(position)
    }

    /// Floor under `position`, probing the cached obstacles on a memo miss.
    ///
    /// When the probe column cannot be cached the floor is probed straight
    /// against physics and the answer is not memoised.
    pub fn find_floor<P: PhysicsQuery + ?Sized>(&mut self, position: Vec3, physics: &P) -> Option<f32> {
        if let Some(sample) = self.floor.get_height(position) {
            return sample.height();
        }
        let probe = floor_probe_region(position, &self.config);
        if !self.cache(&probe, physics).is_cached() {
            return find_floor_uncached(physics, &self.config, position);
        }
        self.probe_and_memoise(position, &probe, physics)
    }

    fn probe_and_memoise<P: PhysicsQuery + ?Sized>(
        &mut self,
        position: Vec3,
        probe: &Aabb,
        physics: &P,
    ) -> Option<f32> {
        let mut candidates = mem::take(&mut self.scratch);
        self.get_overlapping(probe, &mut candidates);
        let height = probe_floor(physics, &self.config, position, &candidates);
        self.scratch = candidates;
        self.floor.set_height(position, height);
        height
    }

    /// Floor under `position` probed against `candidates` on a memo miss.
    pub fn find_floor_among<P: PhysicsQuery + ?Sized>(
        &mut self,
        position: Vec3,
        candidates: &[Obstacle],
        physics: &P,
    ) -> Option<f32> {
        if let Some(sample) = self.floor.get_height(position) {
            return sample.height();
        }
        let height = probe_floor(physics, &self.config, position, candidates);
        self.floor.set_height(position, height);
        height
    }

    /// Checks the straight walk from `origin` to `target`.
    pub fn check_walkability<P: PhysicsQuery + ?Sized>(
        &mut self,
        origin: Vec3,
        target: Vec3,
        radius: f32,
        physics: &P,
    ) -> WalkabilityReport {
        self.check_walkability_bounded(origin, target, radius, None, physics)
    }

    /// Checks the walk and rejects any sample leaving `boundary`.
    pub fn check_walkability_within<P: PhysicsQuery + ?Sized>(
        &mut self,
        origin: Vec3,
        target: Vec3,
        radius: f32,
        boundary: &[Vec2],
        physics: &P,
    ) -> WalkabilityReport {
        self.check_walkability_bounded(origin, target, radius, Some(boundary), physics)
    }

    /// True when a torso capsule swept from `start` to `end` touches any of
    /// `candidates` near the sweep.
    pub fn overlap_torso_segment<P: PhysicsQuery + ?Sized>(
        &mut self,
        start: Vec3,
        end: Vec3,
        radius: f32,
        candidates: &[Obstacle],
        physics: &P,
    ) -> bool {
        let mut near = mem::take(&mut self.scratch);
        sweep_candidates(candidates, start, end, radius, &mut near);
        let blocked = !near.is_empty() && physics.capsule_overlaps(start, end, radius, &near);
        self.scratch = near;
        blocked
    }

    pub(crate) fn check_walkability_bounded<P: PhysicsQuery + ?Sized>(
        &mut self,
        origin: Vec3,
        target: Vec3,
        radius: f32,
        boundary: Option<&[Vec2]>,
        physics: &P,
    ) -> WalkabilityReport {
        let region = walk_region(origin, target, radius, &self.config);
        if !self.cache(&region, physics).is_cached() {
            return check_walkability_uncached(physics, &self.config, origin, target, radius, boundary);
        }
        let config = self.config;
        let mut surface = CachedSurface {
            cache: self,
            physics,
            lost: false,
        };
        let report = walk(&mut surface, &config, origin, target, radius, boundary);
        if surface.lost {
            return check_walkability_uncached(physics, &config, origin, target, radius, boundary);
        }
        report
    }

    fn torso_blocked<P: PhysicsQuery + ?Sized>(
        &mut self,
        start: Vec3,
        end: Vec3,
        radius: f32,
        physics: &P,
    ) -> bool {
        let mut near = mem::take(&mut self.scratch);
        sweep_candidates(&self.obstacles, start, end, radius, &mut near);
        let blocked = !near.is_empty() && physics.capsule_overlaps(start, end, radius, &near);
        self.scratch = near;
        blocked
    }
}

/// Walk surface over a cache. Floor probes leaving the cached region grow
/// it; `lost` is set when growing fails and the walk must be redone
/// uncached.
struct CachedSurface<'a, P: ?Sized> {
    cache: &'a mut WalkabilityCache,
    physics: &'a P,
    lost: bool,
}

impl<P: PhysicsQuery + ?Sized> WalkSurface for CachedSurface<'_, P> {
    fn floor_at(&mut self, probe: Vec3) -> Option<f32> {
        if let Some(sample) = self.cache.is_floor_cached(probe) {
            return sample.height();
        }
        let region = floor_probe_region(probe, &self.cache.config);
        if !self.cache.extend(&region, self.physics).is_cached() {
            self.lost = true;
            return None;
        }
        self.cache.probe_and_memoise(probe, &region, self.physics)
    }

    fn torso_blocked(&mut self, start: Vec3, end: Vec3, radius: f32) -> bool {
        self.cache.torso_blocked(start, end, radius, self.physics)
    }
}

fn sweep_candidates(candidates: &[Obstacle], start: Vec3, end: Vec3, radius: f32, out: &mut Vec<Obstacle>) {
    let swept = Aabb::new(start, end).expanded(Vec3::splat(radius));
    out.clear();
    out.extend(
        candidates
            .iter()
            .filter(|obstacle| obstacle.bounds.intersects(&swept)),
    );
}

/// Hash of an obstacle set that ignores the order physics reported it in.
fn content_hash(obstacles: &[Obstacle]) -> u64 {
    let combined = obstacles.iter().fold(0_u64, |acc, obstacle| {
        let mut hasher = DefaultHasher::new();
        obstacle.hash_contents(&mut hasher);
        acc.wrapping_add(hasher.finish())
    });
    let mut hasher = DefaultHasher::new();
    hasher.write_u64(combined);
    hasher.write_usize(obstacles.len());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walkability::test_world::{ground, Slabs};
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn world() -> Slabs {
        Slabs::new(vec![ground()])
    }

    #[rstest]
    fn contained_region_hits_without_physics(world: Slabs) {
        let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
        let region = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(
            cache.cache(&region, &world),
            CacheOutcome::Refreshed {
                floor_preserved: false
            }
        );
        let inner = Aabb::new(Vec3::splat(0.2), Vec3::splat(0.8));
        assert_eq!(cache.cache(&inner, &world), CacheOutcome::Hit);
        assert_eq!(world.overlaps.get(), 1);
    }

    #[rstest]
    fn overlapping_matches_physics_report(mut world: Slabs) {
        world.boxes.push(Obstacle::new(
            2,
            Aabb::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(4.0, 1.0, 2.0)),
        ));
        let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
        let region = Aabb::new(Vec3::new(-1.0, -1.0, -0.5), Vec3::new(3.5, 1.0, 1.5));
        assert!(cache.cache(&region, &world).is_cached());
        let mut out = Vec::new();
        let expected = world.overlap(&region).unwrap_or_default();
        assert_eq!(cache.get_overlapping(&region, &mut out), expected.len());
        assert_eq!(out, expected);
        assert_eq!(out.len(), 2);
    }

    #[rstest]
    fn capacity_overflow_fails_and_empties(mut world: Slabs) {
        world.boxes.push(Obstacle::new(2, Aabb::new(Vec3::ZERO, Vec3::ONE)));
        let config = WalkabilityConfig {
            obstacle_capacity: 1,
            ..WalkabilityConfig::default()
        };
        let mut cache = WalkabilityCache::new(config);
        assert_eq!(
            cache.cache(&Aabb::new(Vec3::ZERO, Vec3::ONE), &world),
            CacheOutcome::Failed
        );
        assert!(cache.region().is_none());
        assert!(cache.obstacles().is_empty());
    }

    #[rstest]
    fn failed_query_leaves_cache_empty(mut world: Slabs) {
        let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
        assert!(cache.cache(&Aabb::new(Vec3::ZERO, Vec3::ONE), &world).is_cached());
        world.fail = true;
        let far = Aabb::new(Vec3::splat(20.0), Vec3::splat(21.0));
        assert_eq!(cache.cache(&far, &world), CacheOutcome::Failed);
        assert!(cache.obstacles().is_empty());
    }

    #[rstest]
    fn floor_is_memoised(world: Slabs) {
        let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
        let here = Vec3::new(0.1, 0.1, 0.0);
        assert_eq!(cache.find_floor(here, &world), Some(0.0));
        assert_eq!(cache.find_floor(Vec3::new(0.2, 0.2, 0.0), &world), Some(0.0));
        assert_eq!(world.floors.get(), 1);
        assert_eq!(cache.is_floor_cached(here), Some(FloorSample::Floor(0.0)));
    }

    #[rstest]
    fn unchanged_obstacles_preserve_floor(world: Slabs) {
        let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
        let _ = cache.find_floor(Vec3::ZERO, &world);
        cache.reset(false);
        let outcome = cache.cache(&floor_probe_region(Vec3::ZERO, cache.config()), &world);
        assert_eq!(
            outcome,
            CacheOutcome::Refreshed {
                floor_preserved: true
            }
        );
        assert!(cache.is_floor_cached(Vec3::ZERO).is_some());
    }

    #[rstest]
    fn changed_obstacles_drop_floor(mut world: Slabs) {
        let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
        let _ = cache.find_floor(Vec3::ZERO, &world);
        world.boxes.push(Obstacle::new(
            7,
            Aabb::new(Vec3::new(-0.5, -0.5, 0.0), Vec3::new(0.5, 0.5, 0.2)),
        ));
        cache.reset(false);
        let outcome = cache.cache(&floor_probe_region(Vec3::ZERO, cache.config()), &world);
        assert_eq!(
            outcome,
            CacheOutcome::Refreshed {
                floor_preserved: false
            }
        );
        assert!(cache.is_floor_cached(Vec3::ZERO).is_none());
        let raised = cache.find_floor(Vec3::new(0.0, 0.0, 0.1), &world);
        assert_relative_eq!(raised.unwrap_or(f32::NAN), 0.2);
    }

    #[rstest]
    fn walk_matches_uncached(mut world: Slabs) {
        world.boxes.push(Obstacle::new(
            2,
            Aabb::new(Vec3::new(2.0, -1.0, 0.0), Vec3::new(2.5, 1.0, 2.0)),
        ));
        let config = WalkabilityConfig::default();
        let mut cache = WalkabilityCache::new(config);
        for target in [Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0)] {
            let cached = cache.check_walkability(Vec3::ZERO, target, 0.4, &world);
            let direct = check_walkability_uncached(&world, &config, Vec3::ZERO, target, 0.4, None);
            assert_eq!(cached, direct);
        }
        assert!(!cache.check_walkability(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 0.4, &world).walkable);
        assert!(cache.check_walkability(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0), 0.4, &world).walkable);
    }

    #[rstest]
    fn extending_keeps_the_earlier_region(world: Slabs) {
        let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
        let near = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let deep = Aabb::new(Vec3::new(0.0, 0.0, -6.0), Vec3::new(1.0, 1.0, -5.0));
        assert!(cache.cache(&near, &world).is_cached());
        assert!(cache.extend(&deep, &world).is_cached());
        assert!(cache.covers(&near));
        assert!(cache.covers(&deep));
        assert_eq!(cache.extend(&near, &world), CacheOutcome::Hit);
        assert_eq!(world.overlaps.get(), 2);
    }

    #[rstest]
    fn torso_segment_ignores_far_candidates(world: Slabs) {
        let mut cache = WalkabilityCache::new(WalkabilityConfig::default());
        let pillar = Obstacle::new(
            9,
            Aabb::new(Vec3::new(1.0, -0.2, 0.0), Vec3::new(1.4, 0.2, 3.0)),
        );
        let start = Vec3::new(0.0, 0.0, 1.0);
        assert!(cache.overlap_torso_segment(start, Vec3::new(2.0, 0.0, 1.0), 0.3, &[pillar], &world));
        assert!(!cache.overlap_torso_segment(start, Vec3::new(0.0, 2.0, 1.0), 0.3, &[pillar], &world));
    }

    #[rstest]
    fn content_hash_ignores_order() {
        let a = Obstacle::new(1, Aabb::new(Vec3::ZERO, Vec3::ONE));
        let b = Obstacle::new(2, Aabb::new(Vec3::ONE, Vec3::splat(2.0)));
        assert_eq!(content_hash(&[a, b]), content_hash(&[b, a]));
        assert_ne!(content_hash(&[a, b]), content_hash(&[a]));
    }
}
