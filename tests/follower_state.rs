//! Saving and resuming follower progress.

use glam::Vec3;
use rstest::rstest;
use strider::{FollowerState, PathFollower, PathHandle, PersistError};
use test_utils::straight_path;

fn follower_midway() -> (PathFollower, PathHandle) {
    let path = straight_path(20.0, 10.0);
    let mut follower = PathFollower::default();
    follower.attach_to_path(Some(path.clone()));
    let mut position = Vec3::ZERO;
    let mut velocity = Vec3::ZERO;
    for _ in 0..30 {
        let result = follower
            .update(position, velocity, 0.1)
            .expect("path attached");
        velocity = result.velocity;
        position += velocity * 0.1;
    }
    (follower, path)
}

#[rstest]
fn snapshot_resumes_on_another_follower() {
    let (follower, path) = follower_midway();
    let mut buffer = Vec::new();
    follower.write_state(&mut buffer).expect("write state");

    let mut resumed = PathFollower::default();
    resumed.attach_to_path(Some(path));
    assert!(resumed.read_state(buffer.as_slice()).expect("read state"));
    assert_eq!(resumed.save_state(), follower.save_state());
    assert_eq!(resumed.lookahead_position(), follower.lookahead_position());
}

#[rstest]
fn stale_snapshot_forces_reseed() {
    let (mut follower, path) = follower_midway();
    let saved = follower.save_state();
    path.modify(|points| points.push(Vec3::new(30.0, 0.0, 0.0).into()));

    assert!(!follower.restore_state(&saved));
    let agent = Vec3::new(25.0, 0.5, 0.0);
    follower.update(agent, Vec3::ZERO, 0.1).expect("path attached");
    assert_eq!(follower.lookahead_segment_index(), 2);
}

#[rstest]
fn snapshot_for_missing_segment_is_rejected() {
    let (mut follower, _path) = follower_midway();
    let state = FollowerState {
        segment_index: 9,
        ..follower.save_state()
    };
    assert!(!follower.restore_state(&state));
}

#[rstest]
fn unattached_follower_ignores_snapshots() {
    let (follower, _path) = follower_midway();
    let mut fresh = PathFollower::default();
    assert!(!fresh.restore_state(&follower.save_state()));
}

#[rstest]
fn garbage_is_a_decode_error() {
    let mut follower = PathFollower::default();
    let err = follower.read_state(&b"{\"segment_index\":"[..]);
    assert!(matches!(err, Err(PersistError::Decode(_))));
}
