use log::{debug, trace};
use rand::{rngs::StdRng, SeedableRng};
use strum::{Display, VariantArray};

use crate::{
    env::{DiscreteActionSpace, Environment, Report},
    error::SlitherError,
};

use super::{
    board::{Board, Cell, Dir},
    reward::{self, Move, RewardConfig},
    vision::{self, VisionConfig, VisionState},
};

/// Default board width
pub const WIDTH: i32 = 10;
/// Default board height
pub const HEIGHT: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlitherConfig {
    pub width: i32,
    pub height: i32,
    /// Number of growth apples kept on the board
    pub green_apples: usize,
    pub initial_length: usize,
    /// Plain moves allowed in a row without eating
    pub step_limit: u32,
    pub vision: VisionConfig,
    pub reward: RewardConfig,
}

impl Default for SlitherConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            green_apples: 2,
            initial_length: 3,
            step_limit: 100,
            vision: VisionConfig::default(),
            reward: RewardConfig::default(),
        }
    }
}

impl SlitherConfig {
    /// Check that the initial snake and every apple fit on the board
    pub fn validate(&self) -> Result<(), SlitherError> {
        if self.width < 1 || self.height < 1 {
            return Err(SlitherError::InvalidConfig(format!(
                "board must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.initial_length < 1 || self.initial_length > self.width as usize {
            return Err(SlitherError::InvalidConfig(format!(
                "initial length {} does not fit a row of width {}",
                self.initial_length, self.width
            )));
        }
        let cells = self.width.checked_mul(self.height).ok_or_else(|| {
            SlitherError::InvalidConfig(format!(
                "board of {}x{} cells is too large",
                self.width, self.height
            ))
        })? as usize;
        if self.initial_length + self.green_apples + 1 > cells {
            return Err(SlitherError::InvalidConfig(format!(
                "{} cells cannot hold a snake of length {} and {} apples",
                cells,
                self.initial_length,
                self.green_apples + 1
            )));
        }
        if self.vision.near > self.vision.mid {
            return Err(SlitherError::InvalidConfig(String::from(
                "near vision band must not exceed the mid band",
            )));
        }
        Ok(())
    }
}

/// Why an episode ended
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    #[strum(to_string = "hit a wall")]
    WallCollision,
    #[strum(to_string = "ran into itself")]
    SelfCollision,
    #[strum(to_string = "shrank to nothing")]
    StarvedOut,
    #[strum(to_string = "went too long without eating")]
    StepLimitExceeded,
    #[strum(to_string = "filled the board")]
    BoardFilled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Terminated(Termination),
}

/// Snake on a walled grid with growth (green) and shrink (red) apples
///
/// The snake observes the board through [`VisionState`] and is driven either by an agent through
/// [`Environment::step`] or directly through [`Slither::advance`].
pub struct Slither {
    config: SlitherConfig,
    board: Board,
    rng: StdRng,
    status: Status,
    steps_since_food: u32,
    steps: u32,
    pub report: Report,
}

impl Slither {
    /// Start an episode with an entropy-seeded random source
    pub fn new(config: SlitherConfig) -> Result<Self, SlitherError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Start an episode with a deterministic random source
    pub fn with_seed(config: SlitherConfig, seed: u64) -> Result<Self, SlitherError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Start an episode drawing every placement from `rng`
    pub fn with_rng(config: SlitherConfig, mut rng: StdRng) -> Result<Self, SlitherError> {
        config.validate()?;
        let board = Self::spawn(&config, &mut rng)?;
        Ok(Self {
            config,
            board,
            rng,
            status: Status::Active,
            steps_since_food: 0,
            steps: 0,
            report: Report::new(vec!["length", "reward", "steps"]),
        })
    }

    fn spawn(config: &SlitherConfig, rng: &mut StdRng) -> Result<Board, SlitherError> {
        Board::spawn(
            config.width,
            config.height,
            config.initial_length,
            config.green_apples,
            rng,
        )
    }

    pub fn config(&self) -> &SlitherConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Cell grid for display, indexed `[y][x]`
    pub fn grid(&self) -> Vec<Vec<Cell>> {
        self.board.grid()
    }

    pub fn length(&self) -> usize {
        self.board.snake.len()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Moves made this episode
    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn steps_since_food(&self) -> u32 {
        self.steps_since_food
    }

    /// Current vision, or `None` once the snake has shrunk away
    pub fn state(&self) -> Option<VisionState> {
        (!self.board.snake.is_empty())
            .then(|| vision::observe(&self.board, self.board.snake.head(), &self.config.vision))
    }

    /// Raw cell symbols from the head to the wall in `dir`
    pub fn look(&self, dir: Dir) -> Option<Vec<char>> {
        (!self.board.snake.is_empty()).then(|| vision::ray(&self.board, self.board.snake.head(), dir))
    }

    /// Move the snake one cell in `dir`
    ///
    /// **Returns** `(reward, terminated)`, or [`SlitherError::EpisodeOver`] if the episode already ended,
    /// in which case nothing changes.
    pub fn advance(&mut self, dir: Dir) -> Result<(f32, bool), SlitherError> {
        if let Status::Terminated(cause) = self.status {
            return Err(SlitherError::EpisodeOver(cause));
        }

        let head = self.board.snake.head();
        let new_head = dir.step(head);
        self.steps += 1;

        let (reward, done) = if !self.board.is_in_bounds(new_head) {
            self.terminate(Termination::WallCollision)
        } else if self.board.snake.contains(&new_head) {
            self.terminate(Termination::SelfCollision)
        } else if let Some(i) = self.board.green.iter().position(|&p| p == new_head) {
            self.eat_green(i, dir)
        } else if self.board.red == new_head {
            self.eat_red(dir)
        } else {
            self.slide(dir)
        };

        self.report.entry("steps").and_modify(|x| *x += 1.0);
        self.report.entry("reward").and_modify(|x| *x += reward as f64);
        self.report.set("length", self.length() as f64);

        Ok((reward, done))
    }

    #[cfg(test)]
    pub(crate) fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    fn terminate(&mut self, cause: Termination) -> (f32, bool) {
        self.status = Status::Terminated(cause);
        debug!(
            "Episode over after {} steps: {} (length {})",
            self.steps,
            cause,
            self.length()
        );

        let reward = match cause {
            Termination::WallCollision | Termination::SelfCollision => reward::COLLISION,
            Termination::StarvedOut => reward::STARVED,
            Termination::StepLimitExceeded => reward::STEP_LIMIT,
            Termination::BoardFilled => reward::FOOD,
        };
        (reward, true)
    }

    fn eat_green(&mut self, index: usize, dir: Dir) -> (f32, bool) {
        let new_head = self.board.green.remove(index);
        debug_assert_eq!(new_head, dir.step(self.board.snake.head()));
        self.board.snake.body.push_front(new_head);
        self.steps_since_food = 0;
        trace!("Ate a green apple at {:?}, length {}", new_head, self.length());

        match self.board.sample_empty(&mut self.rng) {
            Ok(pos) => {
                self.board.green.push(pos);
                (reward::FOOD, false)
            }
            Err(_) => self.terminate(Termination::BoardFilled),
        }
    }

    fn eat_red(&mut self, dir: Dir) -> (f32, bool) {
        let new_head = dir.step(self.board.snake.head());
        // The new spot is drawn while the tail still covers its cells
        let respawn = self.board.sample_empty(&mut self.rng);
        self.board.snake.body.push_front(new_head);
        self.board.snake.body.pop_back();
        self.board.snake.body.pop_back();
        trace!("Ate the red apple at {:?}, length {}", new_head, self.length());

        if self.board.snake.is_empty() {
            return self.terminate(Termination::StarvedOut);
        }

        self.steps_since_food = 0;
        match respawn {
            Ok(pos) => {
                self.board.red = pos;
                (self.config.reward.shrink(), false)
            }
            Err(_) => {
                let (_, done) = self.terminate(Termination::BoardFilled);
                (self.config.reward.shrink(), done)
            }
        }
    }

    fn slide(&mut self, dir: Dir) -> (f32, bool) {
        let head = self.board.snake.head();
        let new_head = dir.step(head);
        let sight = self
            .config
            .reward
            .danger
            .then(|| vision::scan(&self.board, head, dir, &self.config.vision));

        let green_before = self.board.nearest_green(head);
        let red_before = self.board.red_distance(head);

        self.board.snake.body.push_front(new_head);
        self.board.snake.body.pop_back();
        self.steps_since_food += 1;

        let reward = self.config.reward.plain_move(&Move {
            green: (green_before, self.board.nearest_green(new_head)),
            red: (red_before, self.board.red_distance(new_head)),
            sight,
            length: self.length(),
        });

        if self.steps_since_food > self.config.step_limit {
            return self.terminate(Termination::StepLimitExceeded);
        }

        (reward, false)
    }
}

impl DiscreteActionSpace for Slither {
    fn actions(&self) -> Vec<Self::Action> {
        Dir::VARIANTS.to_vec()
    }
}

impl Environment for Slither {
    type State = VisionState;
    type Action = Dir;
    type Error = SlitherError;

    fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    fn reset(&mut self) -> Result<Self::State, Self::Error> {
        self.board = Self::spawn(&self.config, &mut self.rng)?;
        self.status = Status::Active;
        self.steps_since_food = 0;
        self.steps = 0;
        self.report.set("length", self.length() as f64);

        Ok(vision::observe(
            &self.board,
            self.board.snake.head(),
            &self.config.vision,
        ))
    }

    fn step(&mut self, action: Self::Action) -> Result<(Option<Self::State>, f32), Self::Error> {
        let (reward, done) = self.advance(action)?;
        // Only a snake that shrank away has nothing left to observe
        let next_state = self.state();
        debug_assert!(next_state.is_some() || done);
        Ok((next_state, reward))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{seq::SliceRandom, Rng};

    use crate::gym::board::Pos;

    use super::*;

    fn env_with(snake: &[Pos], green: &[Pos], red: Pos) -> Slither {
        let mut env = Slither::with_seed(SlitherConfig::default(), 42).unwrap();
        env.board = Board::fixture(WIDTH, HEIGHT, snake, green, red);
        env
    }

    fn body(env: &Slither) -> Vec<Pos> {
        env.board.snake.segments().copied().collect()
    }

    fn assert_disjoint(env: &Slither) {
        let mut seen = HashSet::new();
        for pos in env.board.snake.segments() {
            assert!(seen.insert(*pos), "Snake overlaps itself at {pos:?}");
            assert!(env.board.is_in_bounds(*pos), "Snake out of bounds at {pos:?}");
        }
        for pos in &env.board.green {
            assert!(seen.insert(*pos), "Green apple overlaps at {pos:?}");
        }
        if env.is_active() {
            assert!(seen.insert(env.board.red), "Red apple overlaps");
            assert_eq!(env.board.green.len(), 2, "Always two green apples");
        }
    }

    #[test]
    fn eating_green_apple_grows_the_snake() {
        let mut env = env_with(&[(5, 5), (4, 5), (3, 5)], &[(6, 5), (0, 0)], (9, 9));

        let (reward, done) = env.advance(Dir::Right).unwrap();

        assert_eq!(reward, 20.0, "Green apple reward");
        assert!(!done, "Eating does not end the episode");
        assert_eq!(body(&env), [(6, 5), (5, 5), (4, 5), (3, 5)], "Grew by one at the head");
        assert!(!env.board.green.contains(&(6, 5)), "Eaten apple is gone");
        assert!(env.board.green.contains(&(0, 0)), "Other apple untouched");
        assert_eq!(env.board.green.len(), 2, "Eaten apple replaced");
        assert_disjoint(&env);
    }

    #[test]
    fn wall_collision() {
        let mut env = env_with(&[(9, 5), (8, 5), (7, 5)], &[(0, 0), (0, 1)], (0, 2));

        assert_eq!(env.advance(Dir::Right), Ok((-100.0, true)));
        assert_eq!(env.status(), Status::Terminated(Termination::WallCollision));
        assert_eq!(body(&env), [(9, 5), (8, 5), (7, 5)], "Snake stays put");
    }

    #[test]
    fn self_collision() {
        let mut env = env_with(
            &[(5, 5), (5, 6), (6, 6), (6, 5), (6, 4)],
            &[(0, 0), (0, 1)],
            (0, 2),
        );

        assert_eq!(env.advance(Dir::Right), Ok((-100.0, true)));
        assert_eq!(env.status(), Status::Terminated(Termination::SelfCollision));
    }

    #[test]
    fn reversing_into_the_neck_is_fatal() {
        let mut env = env_with(&[(5, 5), (4, 5), (3, 5)], &[(0, 0), (0, 1)], (0, 2));
        assert_eq!(env.advance(Dir::Left), Ok((-100.0, true)));
        assert_eq!(env.status(), Status::Terminated(Termination::SelfCollision));
    }

    #[test]
    fn moving_after_termination_is_rejected() {
        let mut env = env_with(&[(0, 5), (1, 5), (2, 5)], &[(9, 0), (9, 1)], (9, 2));
        env.advance(Dir::Left).unwrap();

        let before = env.board.clone();
        assert_eq!(
            env.advance(Dir::Up),
            Err(SlitherError::EpisodeOver(Termination::WallCollision))
        );
        assert_eq!(env.board, before, "Dead episode is not mutated");
    }

    #[test]
    fn red_apple_shrinks_the_snake() {
        let mut env = env_with(&[(5, 5), (4, 5), (3, 5)], &[(0, 0), (0, 1)], (6, 5));

        let (reward, done) = env.advance(Dir::Right).unwrap();

        assert_eq!(reward, -20.0, "Shaped shrink penalty");
        assert!(!done);
        assert_eq!(body(&env), [(6, 5), (5, 5)], "Net shrink by one");
        assert_ne!(env.board.red, (6, 5), "Red apple moved");
        assert_disjoint(&env);
    }

    #[test]
    fn red_apple_with_plain_rewards() {
        let mut env = env_with(&[(5, 5), (4, 5), (3, 5)], &[(0, 0), (0, 1)], (6, 5));
        env.config.reward.shaped = false;
        assert_eq!(env.advance(Dir::Right), Ok((-10.0, false)));
    }

    #[test]
    fn shrinking_to_nothing_ends_the_episode() {
        let mut env = env_with(&[(5, 5)], &[(0, 0), (0, 1)], (5, 4));

        assert_eq!(env.advance(Dir::Up), Ok((-100.0, true)));
        assert_eq!(env.status(), Status::Terminated(Termination::StarvedOut));
        assert_eq!(env.length(), 0);
        assert_eq!(env.state(), None, "No head, no vision");
    }

    #[test]
    fn starvation() {
        let mut env = env_with(&[(1, 5), (0, 5)], &[(0, 0), (0, 1)], (9, 9));
        env.steps_since_food = env.config.step_limit;

        assert_eq!(env.advance(Dir::Right), Ok((-50.0, true)));
        assert_eq!(env.status(), Status::Terminated(Termination::StepLimitExceeded));
    }

    #[test]
    fn step_limit_counts_plain_moves_only() {
        let mut env = env_with(&[(1, 5), (0, 5)], &[(0, 0), (5, 5)], (9, 9));
        env.config.step_limit = 3;

        for _ in 0..3 {
            assert!(!env.advance(Dir::Right).unwrap().1);
        }
        assert_eq!(env.steps_since_food(), 3);
        assert_eq!(env.advance(Dir::Right), Ok((20.0, false)), "Eating at (5,5)");
        assert_eq!(env.steps_since_food(), 0, "Counter reset by food");
        assert!(!env.advance(Dir::Up).unwrap().1);
    }

    #[test]
    fn filling_the_board_is_a_win() {
        let config = SlitherConfig {
            width: 3,
            height: 2,
            green_apples: 2,
            initial_length: 2,
            ..Default::default()
        };
        let mut env = Slither::with_seed(config, 1).unwrap();
        env.board = Board::fixture(3, 2, &[(1, 0), (0, 0), (0, 1)], &[(2, 0), (1, 1)], (2, 1));

        assert_eq!(env.advance(Dir::Right), Ok((20.0, true)));
        assert_eq!(env.status(), Status::Terminated(Termination::BoardFilled));
    }

    #[test]
    fn red_apple_respawns_before_the_tail_moves() {
        let config = SlitherConfig {
            width: 5,
            height: 1,
            green_apples: 1,
            ..Default::default()
        };
        let mut env = Slither::with_seed(config, 1).unwrap();
        env.board = Board::fixture(5, 1, &[(2, 0), (1, 0), (0, 0)], &[(4, 0)], (3, 0));

        assert_eq!(env.advance(Dir::Right), Ok((-20.0, true)), "No free cell before trimming");
        assert_eq!(env.status(), Status::Terminated(Termination::BoardFilled));
        assert_eq!(body(&env), [(3, 0), (2, 0)], "The shrink still happened");
    }

    #[test]
    fn red_apple_never_lands_on_the_old_tail() {
        for seed in 0..50 {
            let config = SlitherConfig {
                width: 6,
                height: 1,
                green_apples: 1,
                ..Default::default()
            };
            let mut env = Slither::with_seed(config, seed).unwrap();
            env.board = Board::fixture(6, 1, &[(2, 0), (1, 0), (0, 0)], &[(5, 0)], (3, 0));

            assert_eq!(env.advance(Dir::Right), Ok((-20.0, false)));
            assert_eq!(env.board.red, (4, 0), "Only free cell before the move");
        }
    }

    #[test]
    fn starved_snake_cannot_move() {
        let mut env = env_with(&[(5, 5)], &[(0, 0), (0, 1)], (5, 4));
        let (next, _) = env.step(Dir::Up).unwrap();
        assert_eq!(next, None, "Nothing left to observe");

        assert_eq!(
            env.advance(Dir::Up),
            Err(SlitherError::EpisodeOver(Termination::StarvedOut))
        );
        assert_eq!(env.length(), 0);
    }

    #[test]
    fn same_seed_same_episode() {
        fn run(seed: u64) -> (Vec<f32>, Status) {
            let mut env = Slither::with_seed(SlitherConfig::default(), seed).unwrap();
            let mut actions = StdRng::seed_from_u64(99);
            let mut rewards = Vec::new();
            while env.is_active() {
                let dir = *Dir::VARIANTS.choose(&mut actions).unwrap();
                rewards.push(env.advance(dir).unwrap().0);
            }
            (rewards, env.status())
        }

        assert_eq!(run(7), run(7));
    }

    #[test]
    fn invariants_hold_over_random_play() {
        let mut env = Slither::with_seed(SlitherConfig::default(), 3).unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        for _ in 0..200 {
            env.reset().unwrap();
            assert_disjoint(&env);
            while env.is_active() {
                let dir = Dir::try_from(rng.gen_range(0..4usize)).unwrap();
                env.advance(dir).unwrap();
                assert_disjoint(&env);
            }
        }
    }

    #[test]
    fn step_reports_terminal_transitions() {
        let mut env = env_with(&[(9, 5), (8, 5), (7, 5)], &[(0, 0), (0, 1)], (0, 2));
        let (next, _) = env.step(Dir::Up).unwrap();
        assert!(next.is_some(), "Plain move yields the next vision");

        let before = env.state();
        let (next, reward) = env.step(Dir::Right).unwrap();
        assert_eq!(reward, -100.0);
        assert_eq!(next, before, "A wall leaves the snake where it was");
        assert!(!env.is_active());

        let state = env.reset().unwrap();
        assert!(env.is_active(), "Reset revives the episode");
        assert_eq!(env.length(), 3);
        assert_eq!(Some(state), env.state());
    }

    #[test]
    fn report_tracks_the_episode() {
        let mut env = env_with(&[(5, 5), (4, 5), (3, 5)], &[(6, 5), (0, 0)], (9, 9));
        env.advance(Dir::Right).unwrap();
        env.advance(Dir::Left).unwrap();

        let report = env.report.take();
        assert_eq!(report["steps"], 2.0);
        assert_eq!(report["length"], 4.0);
    }

    #[test]
    fn invalid_configs() {
        let tiny = SlitherConfig {
            width: 2,
            height: 1,
            ..Default::default()
        };
        assert!(matches!(
            Slither::new(tiny),
            Err(SlitherError::InvalidConfig(_))
        ));

        let crowded = SlitherConfig {
            width: 3,
            height: 1,
            green_apples: 1,
            ..Default::default()
        };
        assert!(crowded.validate().is_err());

        let huge = SlitherConfig {
            width: i32::MAX,
            height: 3,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(SlitherError::InvalidConfig(_))));
        assert!(SlitherConfig::default().validate().is_ok());
    }
}
