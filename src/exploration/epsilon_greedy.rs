use rand::Rng;

use crate::{assert_interval, decay::Decay};

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    pub fn new(decay: D) -> Self {
        Self { epsilon: decay }
    }

    /// Epsilon threshold for an episode
    ///
    /// **Panics** if the decay strategy yields a value outside `[0,1]`
    pub fn epsilon(&self, episode: u32) -> f32 {
        let epsilon = self.epsilon.evaluate(episode as f32);
        assert_interval!(epsilon, 0.0, 1.0);
        epsilon
    }

    /// Invoke epsilon greedy policy for an episode
    pub fn choose<R: Rng>(&self, episode: u32, rng: &mut R) -> Choice {
        Self::roll(self.epsilon(episode), rng)
    }

    /// Invoke epsilon greedy policy with an explicit epsilon
    ///
    /// An epsilon of exactly zero never explores and draws nothing from `rng`.
    pub fn roll<R: Rng>(epsilon: f32, rng: &mut R) -> Choice {
        if epsilon > 0.0 && rng.gen::<f32>() < epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}
