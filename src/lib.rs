#![cfg_attr(docsrs, feature(doc_cfg))]
//! Locomotion prediction and walkability caching for simulated agents.
//!
//! [`PathFollower`] turns a path into per-tick steering and predicted
//! motion. [`WalkabilityCacheManager`] answers floor and walkability
//! questions per actor, reusing nearby physics results through pooled
//! [`WalkabilityCache`]s. The physics engine stays behind [`PhysicsQuery`].
pub mod config;
pub mod constants;
pub mod floor_cache;
pub mod geometry;
pub mod logging;
pub mod numeric;
pub mod path;
pub mod physics;
#[cfg(feature = "ecs")]
#[cfg_attr(docsrs, doc(cfg(feature = "ecs")))]
pub mod plugin;
pub mod vector_math;
pub mod walkability;

pub use config::{ConfigError, NavigationConfig, WalkabilityConfig};
pub use floor_cache::{FloorCellKey, FloorHeightCache, FloorSample};
pub use geometry::Aabb;
pub use logging::init as init_logging;
pub use path::{
    FollowerState, FollowerStatus, NavPath, NavigationType, PathControlPoint, PathDistance,
    PathFollowResult, PathFollower, PathFollowerParams, PathHandle, PathPoint, PersistError,
    PredictedState,
};
pub use physics::{Obstacle, ObstacleId, PhysicsError, PhysicsQuery};
#[cfg(feature = "ecs")]
#[cfg_attr(docsrs, doc(cfg(feature = "ecs")))]
pub use plugin::{EntityWalkability, WalkabilityPlugin};
pub use walkability::{
    CacheOutcome, WalkabilityCache, WalkabilityCacheManager, WalkabilityOracle, WalkabilityReport,
    WalkabilityStats,
};

pub mod prelude {
    //! Common imports for hosts.
    //!
    //! ```rust,no_run
    //! use strider::prelude::*;
    //! ```

    pub use crate::{
        Aabb, NavigationConfig, PathFollower, PathHandle, PhysicsQuery, WalkabilityCacheManager,
        WalkabilityOracle,
    };
    #[cfg(feature = "ecs")]
    pub use crate::WalkabilityPlugin;
}
