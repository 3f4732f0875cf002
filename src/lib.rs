//! A snake on a walled grid with growth and shrink apples, and a tabular Q-learning agent that
//! learns to play it from four directional sightlines.

/// Learning algorithms
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Environment
pub mod env;

/// Error types
pub mod error;

/// Exploration policies
pub mod exploration;

/// The snake environment
pub mod gym;

/// Saved models
pub mod persistence;

/// Terminal user interface
#[cfg(feature = "viz")]
pub mod viz;

/// Command line modes
#[cfg(feature = "viz")]
pub mod modes;

mod util;
