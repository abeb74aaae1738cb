//! Turns an attached path into per-tick steering.
//!
//! The follower keeps a lookahead point on the control-point polyline and
//! steers the agent towards it. The lookahead only moves forward: it is
//! pushed to where the path leaves a sphere around the agent whose radius
//! grows with speed. Speed is acceleration limited and, when stopping at the
//! end, bounded by the braking distance left.

#[cfg(feature = "ecs")]
use bevy_ecs::prelude::Component;
use glam::Vec3;
use log::{debug, trace};

use super::{
    FollowerState, NavigationType, PathControlPoint, PathDistance, PathFollowerParams, PathHandle,
    PersistError,
};
use crate::constants::GEOMETRY_EPSILON;
use crate::numeric::{count_to_f32, step_count};
use crate::vector_math::{
    closest_fraction_on_segment, distance, flatten, normalize_or_zero, sphere_exit_fraction,
};
use crate::walkability::WalkabilityOracle;

/// Lifecycle of a follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerStatus {
    /// No path attached.
    Unattached,
    /// Following the attached path.
    Following,
    /// The last update reported arrival.
    ReachedEnd,
}

/// One sample of predicted motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedState {
    /// Seconds after the update.
    pub time: f32,
    /// Predicted agent position.
    pub position: Vec3,
    /// Velocity the follower would request there.
    pub velocity: Vec3,
}

/// Movement instruction produced by [`PathFollower::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathFollowResult {
    /// Velocity to apply this tick.
    pub velocity: Vec3,
    /// True once the lookahead sits on the final point and the agent is
    /// within the end accuracy of it.
    pub reached_end: bool,
    /// Current lookahead point.
    pub follow_target: Vec3,
    /// Next corner ahead of the lookahead, or the final point.
    pub inflection_point: Vec3,
    /// Predicted motion over the configured horizon.
    pub predicted_states: Vec<PredictedState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Progress {
    segment: usize,
    fraction: f32,
    position: Vec3,
    speed: f32,
}

impl Progress {
    const START: Self = Self {
        segment: 0,
        fraction: 0.0,
        position: Vec3::ZERO,
        speed: 0.0,
    };
}

struct Steering {
    velocity: Vec3,
    target: Vec3,
    inflection: Vec3,
    reached_end: bool,
}

/// Follows a shared [`PathHandle`].
#[cfg_attr(feature = "ecs", derive(Component))]
#[derive(Debug, Clone)]
pub struct PathFollower {
    params: PathFollowerParams,
    path: Option<PathHandle>,
    control_points: Vec<PathControlPoint>,
    progress: Progress,
    path_version: Option<u32>,
    seed_pending: bool,
    reached_end: bool,
}

impl Default for PathFollower {
    fn default() -> Self {
        Self::new(PathFollowerParams::default())
    }
}

impl PathFollower {
    /// Creates an unattached follower.
    #[must_use]
    pub fn new(params: PathFollowerParams) -> Self {
        Self {
            params,
            path: None,
            control_points: Vec::new(),
            progress: Progress::START,
            path_version: None,
            seed_pending: false,
            reached_end: false,
        }
    }

    /// Current parameters.
    #[must_use]
    pub const fn params(&self) -> &PathFollowerParams {
        &self.params
    }

    /// Replaces the parameters and re-derives control points in place.
    ///
    /// The lookahead keeps its segment and fraction. Predictions from
    /// earlier updates no longer apply.
    pub fn set_params(&mut self, params: PathFollowerParams) {
        self.params = params;
        let radius = self.params.path_radius;
        for point in &mut self.control_points {
            point.apply_radius(radius);
        }
        self.progress.position = self.point_on(self.progress.segment, self.progress.fraction);
    }

    /// Attaches `path`, or detaches when `None`.
    ///
    /// The next [`Self::update`] seeds the lookahead on the point of the
    /// path closest to the agent.
    pub fn attach_to_path(&mut self, path: Option<PathHandle>) {
        self.reached_end = false;
        let Some(handle) = path else {
            self.path = None;
            self.control_points.clear();
            self.path_version = None;
            self.seed_pending = false;
            self.progress = Progress {
                speed: self.progress.speed,
                ..Progress::START
            };
            debug!("path follower detached");
            return;
        };
        self.path = Some(handle);
        self.rebuild();
    }

    /// Attached path, if any.
    #[must_use]
    pub const fn path(&self) -> Option<&PathHandle> {
        self.path.as_ref()
    }

    /// Control points in path order.
    #[must_use]
    pub fn control_points(&self) -> &[PathControlPoint] {
        &self.control_points
    }

    /// Segment the lookahead occupies.
    #[must_use]
    pub const fn lookahead_segment_index(&self) -> usize {
        self.progress.segment
    }

    /// Position of the lookahead within its segment, in `0..=1`.
    #[must_use]
    pub const fn lookahead_fraction(&self) -> f32 {
        self.progress.fraction
    }

    /// Current lookahead point.
    #[must_use]
    pub const fn lookahead_position(&self) -> Vec3 {
        self.progress.position
    }

    /// Speed requested by the last update.
    #[must_use]
    pub const fn last_output_speed(&self) -> f32 {
        self.progress.speed
    }

    /// Path version the control points were built from.
    #[must_use]
    pub const fn path_version(&self) -> Option<u32> {
        self.path_version
    }

    /// Where the follower is in its lifecycle.
    #[must_use]
    pub const fn status(&self) -> FollowerStatus {
        match (&self.path, self.reached_end) {
            (None, _) => FollowerStatus::Unattached,
            (Some(_), true) => FollowerStatus::ReachedEnd,
            (Some(_), false) => FollowerStatus::Following,
        }
    }

    /// Computes this tick's movement instruction.
    ///
    /// Returns `None` when no path is attached. A path with fewer than two
    /// control points reports arrival at once.
    pub fn update(&mut self, position: Vec3, velocity: Vec3, dt: f32) -> Option<PathFollowResult> {
        let version = self.path.as_ref()?.version();
        if self.path_version != Some(version) {
            debug!(
                "path version changed from {:?} to {version}; rebuilding",
                self.path_version
            );
            self.rebuild();
        }

        if self.control_points.len() < 2 {
            self.reached_end = true;
            self.progress.speed = 0.0;
            let target = self.control_points.first().map_or(position, |p| p.position);
            return Some(PathFollowResult {
                velocity: Vec3::ZERO,
                reached_end: true,
                follow_target: target,
                inflection_point: target,
                predicted_states: Vec::new(),
            });
        }

        if self.seed_pending {
            self.seed(position);
        }
        let mut progress = self.progress;
        let steering = self.steer(&mut progress, position, velocity, dt.max(0.0));
        self.progress = progress;
        self.reached_end = steering.reached_end;

        Some(PathFollowResult {
            velocity: steering.velocity,
            reached_end: steering.reached_end,
            follow_target: steering.target,
            inflection_point: steering.inflection,
            predicted_states: self.predict(position, steering.velocity),
        })
    }

    /// Moves the lookahead `along` units forward, clamped at the end.
    ///
    /// Returns the distance actually covered.
    pub fn advance(&mut self, along: f32) -> f32 {
        let mut progress = self.progress;
        let travelled = self.walk_forward(&mut progress, along);
        self.progress = progress;
        travelled
    }

    /// Point `along` units ahead of the lookahead and the distance actually
    /// covered before the path ended. Does not move the lookahead.
    #[must_use]
    pub fn path_point_ahead(&self, along: f32) -> (Vec3, f32) {
        let mut progress = self.progress;
        let travelled = self.walk_forward(&mut progress, along);
        (progress.position, travelled)
    }

    /// Path length left from the lookahead to the final point, plus the
    /// distance from `current` to the lookahead when given.
    #[must_use]
    pub fn dist_to_end(&self, current: Option<Vec3>) -> f32 {
        if self.control_points.len() < 2 {
            let planar = self.params.use_2d;
            return current
                .zip(self.control_points.first())
                .map_or(0.0, |(from, point)| distance(from, point.position, planar));
        }
        self.remaining_from(&self.progress, current)
    }

    /// Distance ahead to the first control point on `navigation_type`.
    #[must_use]
    pub fn dist_to_navigation_type(&self, navigation_type: NavigationType) -> PathDistance {
        self.dist_to_matching(|point| point.navigation_type == navigation_type)
    }

    /// Distance ahead to the first smart-object link.
    #[must_use]
    pub fn dist_to_smart_object(&self) -> PathDistance {
        self.dist_to_matching(PathControlPoint::is_smart_object)
    }

    /// Segment closest to `position`, or `None` without a segment.
    #[must_use]
    pub fn get_index(&self, position: Vec3) -> Option<usize> {
        self.closest_on_path(position).map(|(segment, _)| segment)
    }

    /// Asks `oracle` whether every leg of `polyline` is walkable for this
    /// follower's agent radius. A polyline without a leg is rejected.
    pub fn check_walkability(&self, polyline: &[Vec3], oracle: &mut impl WalkabilityOracle) -> bool {
        if polyline.len() < 2 {
            return false;
        }
        let radius = self.params.agent_radius;
        polyline.windows(2).all(|pair| match pair {
            [from, to] => oracle.can_walk(*from, *to, radius),
            _ => false,
        })
    }

    /// Snapshot of the following state.
    #[must_use]
    pub const fn save_state(&self) -> FollowerState {
        FollowerState {
            segment_index: self.progress.segment,
            fraction: self.progress.fraction,
            lookahead_position: self.progress.position,
            last_output_speed: self.progress.speed,
            path_version: self.path_version,
        }
    }

    /// Resumes from `state` when it was saved against the attached path's
    /// current version.
    ///
    /// Returns `false` and re-seeds on the next update otherwise.
    pub fn restore_state(&mut self, state: &FollowerState) -> bool {
        let Some(version) = self.path.as_ref().map(PathHandle::version) else {
            return false;
        };
        if self.path_version != Some(version) {
            self.rebuild();
        }
        let segments = self.control_points.len().saturating_sub(1).max(1);
        if state.path_version != Some(version) || state.segment_index >= segments {
            debug!(
                "discarding follower state saved at path version {:?}",
                state.path_version
            );
            self.seed_pending = true;
            return false;
        }
        self.progress = Progress {
            segment: state.segment_index,
            fraction: state.fraction.clamp(0.0, 1.0),
            position: state.lookahead_position,
            speed: state.last_output_speed.max(0.0),
        };
        self.seed_pending = false;
        self.reached_end = false;
        true
    }

    /// Writes [`Self::save_state`] as JSON.
    ///
    /// # Errors
    /// Returns [`PersistError::Encode`] when writing fails.
    pub fn write_state<W: std::io::Write>(&self, writer: W) -> Result<(), PersistError> {
        self.save_state().write_json(writer)
    }

    /// Reads a JSON snapshot and restores it.
    ///
    /// Returns whether the snapshot applied to the attached path.
    ///
    /// # Errors
    /// Returns [`PersistError::Decode`] when the input is not a snapshot.
    pub fn read_state<R: std::io::Read>(&mut self, reader: R) -> Result<bool, PersistError> {
        let state = FollowerState::read_json(reader)?;
        Ok(self.restore_state(&state))
    }

    fn rebuild(&mut self) {
        let Some(handle) = &self.path else {
            return;
        };
        let radius = self.params.path_radius;
        let control_points = &mut self.control_points;
        let version = handle.read(|path| {
            control_points.clear();
            control_points.extend(
                path.points()
                    .iter()
                    .map(|point| PathControlPoint::from_path_point(point, radius)),
            );
            path.version()
        });
        self.path_version = Some(version);
        self.progress = Progress {
            position: self.point_on(0, 0.0),
            speed: self.progress.speed,
            ..Progress::START
        };
        self.seed_pending = true;
        debug!(
            "built {} control points from path version {version}",
            self.control_points.len()
        );
    }

    fn seed(&mut self, position: Vec3) {
        let (segment, fraction) = self.closest_on_path(position).unwrap_or((0, 0.0));
        self.progress.segment = segment;
        self.progress.fraction = fraction;
        self.progress.position = self.point_on(segment, fraction);
        self.seed_pending = false;
        trace!("seeded lookahead on segment {segment} at {fraction:.3}");
    }

    fn closest_on_path(&self, position: Vec3) -> Option<(usize, f32)> {
        let planar = self.params.use_2d;
        let mut best: Option<(usize, f32, f32)> = None;
        for (index, window) in self.control_points.windows(2).enumerate() {
            let [a, b] = window else {
                continue;
            };
            let t = closest_fraction_on_segment(a.position, b.position, position, planar);
            let gap = distance(a.position.lerp(b.position, t), position, planar);
            if best.is_none_or(|(_, _, closest)| gap < closest) {
                best = Some((index, t, gap));
            }
        }
        best.map(|(index, t, _)| (index, t))
    }

    fn segment_ends(&self, segment: usize) -> Option<(Vec3, Vec3)> {
        let a = self.control_points.get(segment)?;
        let b = self.control_points.get(segment + 1)?;
        Some((a.position, b.position))
    }

    fn last_segment(&self) -> usize {
        self.control_points.len().saturating_sub(2)
    }

    fn point_on(&self, segment: usize, fraction: f32) -> Vec3 {
        self.segment_ends(segment).map_or_else(
            || {
                self.control_points
                    .get(segment)
                    .or_else(|| self.control_points.last())
                    .map_or(Vec3::ZERO, |point| point.position)
            },
            |(a, b)| a.lerp(b, fraction),
        )
    }

    fn at_end(&self, progress: &Progress) -> bool {
        progress.segment >= self.last_segment() && progress.fraction >= 1.0
    }

    fn advance_lookahead(&self, progress: &mut Progress, agent: Vec3, reach: f32) {
        let planar = self.params.use_2d;
        let last = self.last_segment();
        while let Some((a, b)) = self.segment_ends(progress.segment) {
            if distance(a, b, planar) > GEOMETRY_EPSILON {
                let Some(exit) = sphere_exit_fraction(a, b, agent, reach, planar) else {
                    break;
                };
                if exit <= progress.fraction {
                    break;
                }
                if exit < 1.0 {
                    progress.fraction = exit;
                    break;
                }
            }
            if progress.segment >= last {
                progress.fraction = 1.0;
                break;
            }
            if !self.params.allow_corner_cutting && distance(agent, b, planar) > self.params.pass_radius {
                progress.fraction = 1.0;
                break;
            }
            progress.segment += 1;
            progress.fraction = 0.0;
        }
        progress.position = self.point_on(progress.segment, progress.fraction);
    }

    fn walk_forward(&self, progress: &mut Progress, along: f32) -> f32 {
        if self.control_points.len() < 2 {
            return 0.0;
        }
        let planar = self.params.use_2d;
        let last = self.last_segment();
        let mut left = along.max(0.0);
        let mut travelled = 0.0;
        while let Some((a, b)) = self.segment_ends(progress.segment) {
            let length = distance(a, b, planar);
            let remaining = length * (1.0 - progress.fraction);
            if left < remaining {
                progress.fraction += left / length;
                travelled += left;
                break;
            }
            travelled += remaining;
            left -= remaining;
            if progress.segment >= last {
                progress.fraction = 1.0;
                break;
            }
            progress.segment += 1;
            progress.fraction = 0.0;
        }
        progress.position = self.point_on(progress.segment, progress.fraction);
        travelled
    }

    fn remaining_from(&self, progress: &Progress, current: Option<Vec3>) -> f32 {
        let planar = self.params.use_2d;
        let to_corner = self
            .segment_ends(progress.segment)
            .map_or(0.0, |(_, b)| distance(progress.position, b, planar));
        let beyond: f32 = self
            .control_points
            .get(progress.segment + 1..)
            .map_or(0.0, |rest| {
                rest.windows(2)
                    .map(|pair| match pair {
                        [a, b] => distance(a.position, b.position, planar),
                        _ => 0.0,
                    })
                    .sum()
            });
        let lead = current.map_or(0.0, |from| distance(from, progress.position, planar));
        to_corner + beyond + lead
    }

    fn dist_to_matching(&self, matches: impl Fn(&PathControlPoint) -> bool) -> PathDistance {
        let planar = self.params.use_2d;
        let segment = self.progress.segment;
        if self.progress.fraction <= 0.0 && self.control_points.get(segment).is_some_and(&matches) {
            return PathDistance::Finite(0.0);
        }
        let mut travelled = 0.0;
        let mut from = self.progress.position;
        for point in self.control_points.iter().skip(segment + 1) {
            travelled += distance(from, point.position, planar);
            if matches(point) {
                return PathDistance::Finite(travelled);
            }
            from = point.position;
        }
        PathDistance::Unreachable
    }

    fn steer(&self, progress: &mut Progress, position: Vec3, velocity: Vec3, dt: f32) -> Steering {
        let params = &self.params;
        let planar = params.use_2d;

        let current_speed = flatten(velocity, planar).length();
        self.advance_lookahead(progress, position, params.lookahead_reach(current_speed));
        let target = progress.position;
        let reached_end = self.at_end(progress)
            && self
                .control_points
                .last()
                .is_some_and(|end| distance(position, end.position, planar) <= params.end_accuracy);

        let mut desired = params.cruise_speed();
        if params.stop_at_end {
            let braking = 2.0 * params.max_decel.max(0.0) * self.remaining_from(progress, Some(position));
            desired = desired.min(braking.sqrt());
        }
        let to_target = flatten(target - position, planar);
        let gap = to_target.length();
        let mut speed = if dt > 0.0 {
            let low = (progress.speed - params.max_decel * dt).max(0.0);
            let high = progress.speed + params.max_accel * dt;
            desired.max(low).min(high).min(gap / dt)
        } else {
            progress.speed.min(desired)
        };
        speed = speed.min(params.max_speed).max(0.0);
        if gap <= GEOMETRY_EPSILON || (reached_end && params.stop_at_end) {
            speed = 0.0;
        }
        progress.speed = speed;

        let inflection = self
            .control_points
            .get(progress.segment + 1)
            .map_or(target, |point| point.position);
        Steering {
            velocity: normalize_or_zero(to_target) * speed,
            target,
            inflection,
            reached_end,
        }
    }

    fn predict(&self, position: Vec3, velocity: Vec3) -> Vec<PredictedState> {
        let horizon = self.params.prediction_horizon;
        let step = self.params.prediction_step;
        if !horizon.is_finite() || !step.is_finite() || horizon <= 0.0 || step <= 0.0 {
            return Vec::new();
        }
        let Some(steps) = step_count(horizon, step) else {
            return Vec::new();
        };
        let mut progress = self.progress;
        let mut predicted = position;
        let mut heading = velocity;
        let mut states = Vec::with_capacity(usize::try_from(steps).unwrap_or_default());
        for i in 1..=steps {
            predicted += heading * step;
            heading = self.steer(&mut progress, predicted, heading, step).velocity;
            states.push(PredictedState {
                time: count_to_f32(i) * step,
                position: predicted,
                velocity: heading,
            });
        }
        states
    }
}
