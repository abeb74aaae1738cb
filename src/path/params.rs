//! Tuning for [`PathFollower`](super::PathFollower).

use serde::{Deserialize, Serialize};

/// Follower configuration. May be replaced between ticks with
/// [`PathFollower::set_params`](super::PathFollower::set_params).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFollowerParams {
    /// Cruise speed.
    pub normal_speed: f32,
    /// Lower bound for the cruise speed. Braking may still go below it.
    pub min_speed: f32,
    /// Hard speed cap.
    pub max_speed: f32,
    /// Maximum speed gain per second.
    pub max_accel: f32,
    /// Maximum speed loss per second.
    pub max_decel: f32,
    /// Scale applied to per-point lateral offsets.
    pub path_radius: f32,
    /// Radius of the agent, used for walkability checks.
    pub agent_radius: f32,
    /// Minimum distance between the agent and the lookahead point.
    pub lookahead_distance: f32,
    /// Extra lookahead per unit of speed, in seconds.
    pub lookahead_time: f32,
    /// Distance to a corner at which the lookahead may round it when
    /// corner cutting is disabled.
    pub pass_radius: f32,
    /// Distance to the final point that counts as arrived.
    pub end_accuracy: f32,
    /// Brake so the agent stops on the final point.
    pub stop_at_end: bool,
    /// Ignore the vertical axis for progress and distances.
    pub use_2d: bool,
    /// Let the lookahead round corners before the agent reaches them.
    pub allow_corner_cutting: bool,
    /// Seconds of motion to predict each update. Zero disables prediction.
    pub prediction_horizon: f32,
    /// Time between predicted samples.
    pub prediction_step: f32,
}

impl Default for PathFollowerParams {
    fn default() -> Self {
        Self {
            normal_speed: 4.0,
            min_speed: 0.0,
            max_speed: 6.0,
            max_accel: 4.0,
            max_decel: 6.0,
            path_radius: 0.5,
            agent_radius: 0.4,
            lookahead_distance: 0.5,
            lookahead_time: 0.25,
            pass_radius: 0.5,
            end_accuracy: 0.2,
            stop_at_end: true,
            use_2d: true,
            allow_corner_cutting: true,
            prediction_horizon: 1.0,
            prediction_step: 0.25,
        }
    }
}

impl PathFollowerParams {
    /// Cruise speed clamped into `[min_speed, max_speed]`.
    #[must_use]
    pub fn cruise_speed(&self) -> f32 {
        self.normal_speed
            .max(self.min_speed)
            .min(self.max_speed)
            .max(0.0)
    }

    /// Lookahead radius for an agent moving at `speed`.
    #[must_use]
    pub fn lookahead_reach(&self, speed: f32) -> f32 {
        (self.lookahead_distance + speed.max(0.0) * self.lookahead_time).max(0.0)
    }
}
