//! Persisted follower progress.

use std::io::{Read, Write};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while persisting follower state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The state could not be written.
    #[error("failed to encode follower state: {0}")]
    Encode(#[source] serde_json::Error),
    /// The input is not a follower state.
    #[error("failed to decode follower state: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Everything needed to resume following without a jump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FollowerState {
    /// Segment the lookahead occupied.
    pub segment_index: usize,
    /// Lookahead position within the segment.
    pub fraction: f32,
    /// Lookahead point.
    pub lookahead_position: Vec3,
    /// Speed requested by the last update.
    pub last_output_speed: f32,
    /// Path version the state belongs to.
    pub path_version: Option<u32>,
}

impl FollowerState {
    /// Writes the state as JSON.
    ///
    /// # Errors
    /// Returns [`PersistError::Encode`] when serialisation or the writer
    /// fails.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), PersistError> {
        serde_json::to_writer(writer, self).map_err(PersistError::Encode)
    }

    /// Reads a state written by [`Self::write_json`].
    ///
    /// # Errors
    /// Returns [`PersistError::Decode`] when the input is not a valid state.
    pub fn read_json<R: Read>(reader: R) -> Result<Self, PersistError> {
        serde_json::from_reader(reader).map_err(PersistError::Decode)
    }
}
