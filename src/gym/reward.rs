use super::vision::{Distance, Object, Sight};

/// Eating a growth apple
pub const FOOD: f32 = 20.0;
/// Running into a wall or into the body
pub const COLLISION: f32 = -100.0;
/// Shrinking down to nothing
pub const STARVED: f32 = -100.0;
/// Going too long without eating
pub const STEP_LIMIT: f32 = -50.0;
pub const SHRINK_SHAPED: f32 = -20.0;
pub const SHRINK_PLAIN: f32 = -10.0;

const STEP_PENALTY: f32 = -0.1;
const GREEN_CLOSER: f32 = 1.0;
const GREEN_AWAY: f32 = -1.5;
const RED_CLOSER: f32 = -0.3;
const RED_AWAY: f32 = 0.3;
const HAZARD_AHEAD: f32 = -5.0;
const GREEN_AHEAD: f32 = 1.0;
const RED_AHEAD: f32 = -1.0;
const SURVIVAL_LENGTH: usize = 5;
const SURVIVAL_PER_SEGMENT: f32 = 0.02;

/// Reward schedule of the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardConfig {
    /// Shape plain moves with distance terms; when off a plain move only costs the step penalty
    pub shaped: bool,
    /// Judge the chosen direction by what the snake saw there before moving
    pub danger: bool,
    /// Small bonus per segment once the snake is long enough
    pub survival: bool,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            shaped: true,
            danger: true,
            survival: true,
        }
    }
}

/// Measurements around a plain move, taken before and after the head advanced
#[derive(Debug, Clone, Copy)]
pub struct Move {
    /// Distance to the nearest growth apple, before and after
    pub green: (Option<i32>, Option<i32>),
    /// Distance to the shrink apple, before and after
    pub red: (i32, i32),
    /// What lay in the chosen direction before moving
    pub sight: Option<Sight>,
    /// Snake length after the move
    pub length: usize,
}

impl RewardConfig {
    pub fn shrink(&self) -> f32 {
        if self.shaped {
            SHRINK_SHAPED
        } else {
            SHRINK_PLAIN
        }
    }

    /// Reward for a move that neither ate nor ended the episode
    pub fn plain_move(&self, m: &Move) -> f32 {
        let mut reward = STEP_PENALTY;
        if !self.shaped {
            return reward;
        }

        if let (Some(before), Some(after)) = m.green {
            if after < before {
                reward += GREEN_CLOSER;
            } else if after > before {
                reward += GREEN_AWAY;
            }
        }

        let (before, after) = m.red;
        if after < before {
            reward += RED_CLOSER;
        } else if after > before {
            reward += RED_AWAY;
        }

        if let Some(sight) = m.sight.filter(|_| self.danger) {
            reward += match (sight.object, sight.distance) {
                (Object::Wall | Object::Body, Distance::Near) => HAZARD_AHEAD,
                (Object::Growth, _) => GREEN_AHEAD,
                (Object::Shrink, _) => RED_AHEAD,
                _ => 0.0,
            };
        }

        if self.survival && m.length > SURVIVAL_LENGTH {
            reward += SURVIVAL_PER_SEGMENT * m.length as f32;
        }

        reward
    }
}
