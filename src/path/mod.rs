//! Path following: shared path data, tuning and the follower itself.

mod follower;
mod params;
mod state;
mod types;

pub use follower::{FollowerStatus, PathFollowResult, PathFollower, PredictedState};
pub use params::PathFollowerParams;
pub use state::{FollowerState, PersistError};
pub use types::{NavPath, NavigationType, PathControlPoint, PathDistance, PathHandle, PathPoint};
