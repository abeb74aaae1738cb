//! Per-actor walkability caches with frame-indexed retention.
//!
//! Call [`WalkabilityCacheManager::pre_update`] once before any query in a
//! tick and [`WalkabilityCacheManager::post_update`] once after every actor
//! ran. Staleness is evaluated lazily: a cache is only refreshed when a query
//! asks for a region it does not cover.

use std::fmt::Debug;
use std::hash::Hash;

#[cfg(feature = "ecs")]
use bevy_ecs::prelude::Resource;
use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use log::debug;

use super::{
    check_walkability_uncached, find_floor_uncached, walk_region, CacheHandle, CacheOutcome,
    CachePool, WalkabilityCache, WalkabilityOracle, WalkabilityReport, WalkabilityStats,
};
use crate::config::WalkabilityConfig;
use crate::floor_cache::FloorSample;
use crate::geometry::Aabb;
use crate::physics::PhysicsQuery;

/// Identifier the manager keys actors by.
pub trait ActorKey: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T: Copy + Eq + Hash + Debug + Send + Sync + 'static> ActorKey for T {}

#[derive(Debug, Clone, Copy)]
struct ActorSlot {
    cache: Option<CacheHandle>,
    last_update_frame: u64,
}

enum Resolved<'a> {
    Unknown,
    Uncached,
    Cached(&'a mut WalkabilityCache),
}

/// Owns one pooled [`WalkabilityCache`] per enabled actor.
///
/// Queries for unknown or disabled actors answer "not found" or "not
/// walkable". When no cache can be provided the query runs uncached.
#[cfg_attr(feature = "ecs", derive(Resource))]
#[derive(Debug)]
pub struct WalkabilityCacheManager<K: ActorKey> {
    actors: HashMap<K, ActorSlot>,
    pool: CachePool,
    frame_id: u64,
    config: WalkabilityConfig,
    stats: WalkabilityStats,
}

impl<K: ActorKey> Default for WalkabilityCacheManager<K> {
    fn default() -> Self {
        Self::new(WalkabilityConfig::default())
    }
}

impl<K: ActorKey> WalkabilityCacheManager<K> {
    /// Creates a manager with an empty pool.
    #[must_use]
    pub fn new(config: WalkabilityConfig) -> Self {
        Self {
            actors: HashMap::new(),
            pool: CachePool::new(config),
            frame_id: 0,
            config,
            stats: WalkabilityStats::default(),
        }
    }

    /// Enables or disables caching for `actor`.
    ///
    /// Enabling keeps any existing cache. Disabling returns the cache to the
    /// pool and forgets the actor.
    pub fn enable_actor(&mut self, actor: K, enabled: bool) {
        if enabled {
            let frame = self.frame_id;
            self.actors.entry(actor).or_insert(ActorSlot {
                cache: None,
                last_update_frame: frame,
            });
        } else {
            self.remove_actor(actor);
        }
    }

    /// Forgets `actor`, releasing its cache. Returns `true` if it was known.
    pub fn remove_actor(&mut self, actor: K) -> bool {
        let Some(slot) = self.actors.remove(&actor) else {
            return false;
        };
        if let Some(handle) = slot.cache {
            self.pool.release(handle);
            debug!("released walkability cache of {actor:?}");
        }
        true
    }

    /// True when `actor` is enabled.
    #[must_use]
    pub fn is_enabled(&self, actor: K) -> bool {
        self.actors.contains_key(&actor)
    }

    /// Number of enabled actors.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Current frame id.
    #[must_use]
    pub const fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Settings shared by every cache.
    #[must_use]
    pub const fn config(&self) -> &WalkabilityConfig {
        &self.config
    }

    /// Read access to the cache of `actor`, if one is allocated.
    #[must_use]
    pub fn cache(&self, actor: K) -> Option<&WalkabilityCache> {
        let handle = self.actors.get(&actor)?.cache?;
        self.pool.get(handle)
    }

    /// Allocates the actor's cache if needed and makes it cover `region`.
    ///
    /// Returns `false` for unknown actors and when the region could not be
    /// cached.
    pub fn prepare_actor<P: PhysicsQuery + ?Sized>(&mut self, actor: K, region: &Aabb, physics: &P) -> bool {
        match resolve(&mut self.actors, &mut self.pool, actor, self.frame_id) {
            Resolved::Cached(cache) => cache.cache(region, physics).is_cached(),
            Resolved::Uncached | Resolved::Unknown => false,
        }
    }

    /// Starts a new frame.
    pub fn pre_update(&mut self) {
        self.frame_id += 1;
    }

    /// Evicts caches left unqueried for longer than the retention window.
    ///
    /// Caches kept although they were not used this frame count as
    /// preserved.
    pub fn post_update(&mut self) {
        let frame = self.frame_id;
        let retention = self.config.retention_frames;
        for (actor, slot) in &mut self.actors {
            let Some(handle) = slot.cache else {
                continue;
            };
            let age = frame.saturating_sub(slot.last_update_frame);
            if age > retention {
                self.pool.release(handle);
                slot.cache = None;
                self.stats.evicted_caches += 1;
                debug!("evicted walkability cache of {actor:?} after {age} idle frames");
            } else if age > 0 {
                self.stats.preserved_floor_caches += 1;
            }
        }
    }

    /// Memoised floor under `position` for `actor`. Never queries physics.
    pub fn is_floor_cached(&mut self, actor: K, position: Vec3) -> Option<FloorSample> {
        let sample = match resolve(&mut self.actors, &mut self.pool, actor, self.frame_id) {
            Resolved::Cached(cache) => cache.is_floor_cached(position),
            Resolved::Uncached | Resolved::Unknown => return None,
        };
        self.stats.floor_requests += 1;
        if sample.is_some() {
            self.stats.floor_cache_hits += 1;
        }
        sample
    }

    /// Floor under `position` for `actor`, memoised in its cache.
    pub fn find_floor<P: PhysicsQuery + ?Sized>(&mut self, actor: K, position: Vec3, physics: &P) -> Option<f32> {
        match resolve(&mut self.actors, &mut self.pool, actor, self.frame_id) {
            Resolved::Unknown => None,
            Resolved::Uncached => {
                self.stats.floor_requests += 1;
                find_floor_uncached(physics, &self.config, position)
            }
            Resolved::Cached(cache) => {
                self.stats.floor_requests += 1;
                if let Some(sample) = cache.is_floor_cached(position) {
                    self.stats.floor_cache_hits += 1;
                    return sample.height();
                }
                cache.find_floor(position, physics)
            }
        }
    }

    /// Checks whether `actor` can walk from `origin` to `target`.
    pub fn check_walkability<P: PhysicsQuery + ?Sized>(
        &mut self,
        actor: K,
        origin: Vec3,
        target: Vec3,
        radius: f32,
        physics: &P,
    ) -> WalkabilityReport {
        self.walk(actor, origin, target, radius, None, physics)
    }

    /// Like [`Self::check_walkability`], also rejecting walks that leave
    /// `boundary`.
    pub fn check_walkability_within<P: PhysicsQuery + ?Sized>(
        &mut self,
        actor: K,
        origin: Vec3,
        target: Vec3,
        radius: f32,
        boundary: &[Vec2],
        physics: &P,
    ) -> WalkabilityReport {
        self.walk(actor, origin, target, radius, Some(boundary), physics)
    }

    /// Resets every allocated cache, e.g. after the world geometry changed.
    pub fn reset_all(&mut self, reset_floor: bool) {
        self.pool.reset_all(reset_floor);
    }

    /// Counters accumulated since creation or the last [`Self::reset_stats`].
    #[must_use]
    pub const fn stats(&self) -> WalkabilityStats {
        self.stats
    }

    /// Zeroes the counters.
    pub fn reset_stats(&mut self) {
        self.stats = WalkabilityStats::default();
    }

    /// Binds `actor` and `physics` into a [`WalkabilityOracle`].
    pub fn oracle<'a, P: PhysicsQuery + ?Sized>(
        &'a mut self,
        actor: K,
        physics: &'a P,
    ) -> ActorWalkability<'a, K, P> {
        ActorWalkability {
            manager: self,
            actor,
            physics,
        }
    }

    fn walk<P: PhysicsQuery + ?Sized>(
        &mut self,
        actor: K,
        origin: Vec3,
        target: Vec3,
        radius: f32,
        boundary: Option<&[Vec2]>,
        physics: &P,
    ) -> WalkabilityReport {
        let cache = match resolve(&mut self.actors, &mut self.pool, actor, self.frame_id) {
            Resolved::Unknown => return WalkabilityReport::BLOCKED,
            Resolved::Uncached => {
                self.stats.walkability_requests += 1;
                return check_walkability_uncached(physics, &self.config, origin, target, radius, boundary);
            }
            Resolved::Cached(cache) => cache,
        };
        self.stats.walkability_requests += 1;
        let region = walk_region(origin, target, radius, &self.config);
        match cache.cache(&region, physics) {
            CacheOutcome::Failed => {
                check_walkability_uncached(physics, &self.config, origin, target, radius, boundary)
            }
            outcome => {
                if outcome == CacheOutcome::Hit {
                    self.stats.walkability_cache_hits += 1;
                }
                cache.check_walkability_bounded(origin, target, radius, boundary, physics)
            }
        }
    }
}

fn resolve<'a, K: ActorKey>(
    actors: &mut HashMap<K, ActorSlot>,
    pool: &'a mut CachePool,
    actor: K,
    frame: u64,
) -> Resolved<'a> {
    let Some(slot) = actors.get_mut(&actor) else {
        return Resolved::Unknown;
    };
    slot.last_update_frame = frame;
    let live = slot.cache.filter(|handle| pool.get(*handle).is_some());
    let handle = match live {
        Some(handle) => handle,
        None => {
            slot.cache = pool.acquire();
            match slot.cache {
                Some(handle) => {
                    debug!("allocated walkability cache for {actor:?}");
                    handle
                }
                None => return Resolved::Uncached,
            }
        }
    };
    pool.get_mut(handle).map_or(Resolved::Uncached, Resolved::Cached)
}

/// A manager bound to one actor and one physics collaborator.
pub struct ActorWalkability<'a, K: ActorKey, P: ?Sized> {
    manager: &'a mut WalkabilityCacheManager<K>,
    actor: K,
    physics: &'a P,
}

impl<K: ActorKey, P: PhysicsQuery + ?Sized> WalkabilityOracle for ActorWalkability<'_, K, P> {
    fn can_walk(&mut self, from: Vec3, to: Vec3, radius: f32) -> bool {
        self.manager
            .check_walkability(self.actor, from, to, radius, self.physics)
            .walkable
    }
}
