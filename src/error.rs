use std::{io, path::PathBuf};

use thiserror::Error;

use crate::gym::Termination;

/// Errors raised by the snake environment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlitherError {
    /// A direction vector that is not one of the four unit steps
    #[error("invalid direction ({0}, {1}); expected a unit step along one axis")]
    InvalidDirection(i32, i32),

    /// An action index outside `0..4`
    #[error("invalid action index {0}; expected 0 (up), 1 (right), 2 (down) or 3 (left)")]
    InvalidAction(usize),

    /// `advance` was called on an episode that has already ended
    #[error("episode is over ({0}); reset the environment before moving")]
    EpisodeOver(Termination),

    /// Every cell of the board is occupied
    #[error("no empty cell left on the board")]
    NoSpace,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised while validating decay schedules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecayError {
    #[error("`vi - vf` must have same sign as `rate` (rate = {rate}, vi = {vi}, vf = {vf})")]
    SignMismatch { rate: f32, vi: f32, vf: f32 },

    #[error("decay horizon must be positive, got {0}")]
    Horizon(f32),
}

/// Errors raised while saving or loading a model snapshot
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("model file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode model: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode model: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("model file has {0} unexpected trailing bytes")]
    TrailingBytes(usize),

    /// The snapshot decoded fine but holds no learned states
    #[error("model {} has no learned states", .0.display())]
    EmptyModel(PathBuf),
}
