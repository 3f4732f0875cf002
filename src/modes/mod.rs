//! Drivers behind the command line: one module per mode

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    error::SlitherError,
    gym::{Slither, SlitherConfig},
};

pub mod checkpoints;
pub mod evaluate;
pub mod play;
pub mod train;
pub mod visualize;

pub use checkpoints::CheckpointOptions;
pub use evaluate::{EvaluateOptions, EvaluationSummary};
pub use play::PlayOptions;
pub use train::{TrainOptions, Trainer};
pub use visualize::VisualizeOptions;

/// Settings shared by every mode
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub env: SlitherConfig,
    /// Seed for every random draw of the run; entropy when absent
    pub seed: Option<u64>,
}

impl Session {
    /// A random source for one part of the run
    ///
    /// Seeded sessions derive a separate stream per `stream` so the environment and the agent
    /// never share draws.
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))),
            None => StdRng::from_entropy(),
        }
    }

    pub fn env(&self, stream: u64) -> Result<Slither, SlitherError> {
        Slither::with_rng(self.env, self.rng(stream))
    }
}

/// Random streams of a session
pub(crate) mod stream {
    pub const ENV: u64 = 0;
    pub const AGENT: u64 = 1;
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn seeded_sessions_repeat() {
        let session = Session {
            seed: Some(7),
            ..Default::default()
        };
        let a = session.env(stream::ENV).unwrap();
        let b = session.env(stream::ENV).unwrap();
        assert_eq!(a.board(), b.board(), "Same seed, same board");

        let mut env_rng = session.rng(stream::ENV);
        let mut agent_rng = session.rng(stream::AGENT);
        assert_ne!(env_rng.gen::<u64>(), agent_rng.gen::<u64>(), "Streams are independent");
    }
}
