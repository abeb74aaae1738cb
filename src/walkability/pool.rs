//! Fixed-capacity pool of walkability caches addressed by generational handles.
//!
//! Slots are allocated lazily up to the capacity and recycled through a free
//! list. Releasing a slot bumps its generation, so a handle kept past its
//! release no longer resolves.

use log::warn;

use super::WalkabilityCache;
use crate::config::WalkabilityConfig;

/// Handle to a cache owned by a [`CachePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheHandle {
    index: u32,
    generation: u32,
}

impl CacheHandle {
    /// Slot index inside the pool.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation the slot had when the handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct PoolSlot {
    generation: u32,
    in_use: bool,
    cache: WalkabilityCache,
}

/// Pool of homogeneous [`WalkabilityCache`] instances.
#[derive(Debug, Clone)]
pub struct CachePool {
    slots: Vec<PoolSlot>,
    free: Vec<u32>,
    capacity: usize,
    config: WalkabilityConfig,
}

impl CachePool {
    /// Creates an empty pool that will hold at most `config.pool_capacity`
    /// caches.
    #[must_use]
    pub fn new(config: WalkabilityConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            capacity: config.pool_capacity,
            config,
        }
    }

    /// Hands out an empty cache, or `None` when every slot is in use.
    pub fn acquire(&mut self) -> Option<CacheHandle> {
        if let Some(index) = self.free.pop() {
            let slot = self.slots.get_mut(usize::try_from(index).ok()?)?;
            slot.in_use = true;
            return Some(CacheHandle {
                index,
                generation: slot.generation,
            });
        }
        if self.slots.len() >= self.capacity {
            warn!("walkability cache pool exhausted at {} caches", self.capacity);
            return None;
        }
        let index = u32::try_from(self.slots.len()).ok()?;
        self.slots.push(PoolSlot {
            generation: 0,
            in_use: true,
            cache: WalkabilityCache::new(self.config),
        });
        Some(CacheHandle {
            index,
            generation: 0,
        })
    }

    /// Returns a cache to the pool. Stale handles are ignored.
    ///
    /// Returns `true` when the handle was live.
    pub fn release(&mut self, handle: CacheHandle) -> bool {
        let Some(slot) = self.slot_mut(handle) else {
            return false;
        };
        slot.cache.reset(true);
        slot.in_use = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        true
    }

    /// Cache behind a live handle.
    #[must_use]
    pub fn get(&self, handle: CacheHandle) -> Option<&WalkabilityCache> {
        let slot = self.slots.get(usize::try_from(handle.index).ok()?)?;
        (slot.in_use && slot.generation == handle.generation).then_some(&slot.cache)
    }

    /// Mutable cache behind a live handle.
    pub fn get_mut(&mut self, handle: CacheHandle) -> Option<&mut WalkabilityCache> {
        self.slot_mut(handle).map(|slot| &mut slot.cache)
    }

    /// Resets every cache currently handed out.
    pub fn reset_all(&mut self, reset_floor: bool) {
        for slot in self.slots.iter_mut().filter(|slot| slot.in_use) {
            slot.cache.reset(reset_floor);
        }
    }

    /// Caches currently handed out.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Maximum number of caches.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn slot_mut(&mut self, handle: CacheHandle) -> Option<&mut PoolSlot> {
        let slot = self.slots.get_mut(usize::try_from(handle.index).ok()?)?;
        (slot.in_use && slot.generation == handle.generation).then_some(slot)
    }
}
