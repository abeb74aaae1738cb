//! Bevy plugin owning the walkability caches of every following entity.
//!
//! The manager lives in the world as a resource keyed by [`Entity`]. Frames
//! open in [`First`] and close in [`Last`], so every system in between may
//! query it.

use bevy_app::{App, First, Last, Plugin};
use bevy_ecs::prelude::*;
use log::trace;

use crate::config::WalkabilityConfig;
use crate::path::PathFollower;
use crate::walkability::WalkabilityCacheManager;

/// Walkability manager resource as installed by [`WalkabilityPlugin`].
pub type EntityWalkability = WalkabilityCacheManager<Entity>;

/// Opens the manager's frame.
pub fn begin_walkability_frame(mut manager: ResMut<EntityWalkability>) {
    manager.pre_update();
}

/// Enables caching for entities that just gained a [`PathFollower`].
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems receive Query parameters by value."
)]
pub fn enable_new_followers(
    mut manager: ResMut<EntityWalkability>,
    added: Query<Entity, Added<PathFollower>>,
) {
    for entity in &added {
        manager.enable_actor(entity, true);
    }
}

/// Releases the caches of entities that lost their [`PathFollower`].
pub fn release_removed_followers(
    mut manager: ResMut<EntityWalkability>,
    mut removed: RemovedComponents<PathFollower>,
) {
    for entity in removed.read() {
        if manager.remove_actor(entity) {
            trace!("released walkability cache of despawned follower {entity:?}");
        }
    }
}

/// Closes the manager's frame and evicts idle caches.
pub fn end_walkability_frame(mut manager: ResMut<EntityWalkability>) {
    manager.post_update();
}

/// Installs [`EntityWalkability`] and its frame systems.
#[derive(Debug, Default, Clone)]
pub struct WalkabilityPlugin {
    /// Settings for every cache the manager creates.
    pub config: WalkabilityConfig,
}

impl Plugin for WalkabilityPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(EntityWalkability::new(self.config));
        app.add_systems(First, (begin_walkability_frame, enable_new_followers).chain());
        app.add_systems(Last, (release_removed_followers, end_walkability_frame).chain());
    }
}
