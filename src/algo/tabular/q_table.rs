use std::collections::{hash_map, HashMap};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    assert_interval,
    decay::{self, Decay},
    env::{DiscreteActionSpace, Environment, Hazards},
    exploration::{Choice, EpsilonGreedy},
};

use super::Hashable;

/// Number of actions a row of the table holds values for
pub const NUM_ACTIONS: usize = 4;

/// Action values of one state, indexed by action
pub type ActionValues = [f32; NUM_ACTIONS];

/// Sparse mapping from states to action values
///
/// Rows are zero-initialized the first time a state is seen and never evicted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable<S>
where
    S: Hashable,
{
    table: HashMap<S, ActionValues>,
}

impl<S: Hashable> Default for QTable<S> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
        }
    }
}

impl<S: Hashable> QTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, state: &S) -> bool {
        self.table.contains_key(state)
    }

    pub fn get(&self, state: &S) -> Option<&ActionValues> {
        self.table.get(state)
    }

    /// Values of `state`, all zero if it has not been seen
    pub fn values(&self, state: &S) -> ActionValues {
        self.table.get(state).copied().unwrap_or_default()
    }

    /// Row of `state`, inserting a zeroed row on first sight
    pub fn init_state(&mut self, state: S) -> &mut ActionValues {
        self.table.entry(state).or_insert([0.0; NUM_ACTIONS])
    }

    pub fn insert(&mut self, state: S, values: ActionValues) -> Option<ActionValues> {
        self.table.insert(state, values)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, S, ActionValues> {
        self.table.iter()
    }
}

impl<S: Hashable> FromIterator<(S, ActionValues)> for QTable<S> {
    fn from_iter<I: IntoIterator<Item = (S, ActionValues)>>(iter: I) -> Self {
        Self {
            table: iter.into_iter().collect(),
        }
    }
}

/// Configuration for the [`QTableAgent`]
#[derive(Debug, Clone)]
pub struct QTableAgentConfig<D: Decay = decay::Linear> {
    pub exploration: EpsilonGreedy<D>,
    pub alpha: f32,
    pub gamma: f32,
    /// Steer clear of actions the state flags as hazards whenever a safe alternative exists
    pub danger_filter: bool,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            exploration: EpsilonGreedy::new(
                decay::Linear::over(0.4, 0.05, 1400.0).expect("default schedule decays downward"),
            ),
            alpha: 0.2,
            gamma: 0.95,
            danger_filter: false,
        }
    }
}

impl QTableAgentConfig<decay::Constant> {
    /// A config that never explores or learns, for playing a trained table
    pub fn greedy(danger_filter: bool) -> Self {
        Self {
            exploration: EpsilonGreedy::new(decay::Constant::new(0.0)),
            alpha: 0.0,
            gamma: 0.0,
            danger_filter,
        }
    }
}

/// A simple Q-learning agent that utilizes a Q-table to learn its environment
///
/// ### Generics
/// - `E` - The [`Environment`] in which the agent will learn
///     - The environment's state and action spaces must both be discrete because a row of Q values
///       is recorded for each state, with one entry per action
///     - For the same reason, the state type must be `Copy`, `Eq`, and `Hash` to be used as a key in a [`HashMap`],
///       and actions must map onto a row index
/// - `D` - The [`Decay`] strategy of the exploration threshold
pub struct QTableAgent<E, D = decay::Linear>
where
    E: Environment + DiscreteActionSpace,
    E::State: Hashable + Hazards<E::Action>,
    E::Action: Copy + Into<usize>,
    D: Decay,
{
    q_table: QTable<E::State>,
    exploration: EpsilonGreedy<D>,
    alpha: f32,   // learning rate
    gamma: f32,   // discount factor
    danger_filter: bool,
    episode: u32, // current episode
    rng: StdRng,
}

impl<E, D> QTableAgent<E, D>
where
    E: Environment + DiscreteActionSpace,
    E::State: Hashable + Hazards<E::Action>,
    E::Action: Copy + Into<usize>,
    D: Decay,
{
    /// Initialize a new `QTableAgent` with an empty table
    ///
    /// ### Parameters
    /// - `alpha` - The learning rate - must be between 0 and 1
    /// - `gamma` - The discount factor - must be between 0 and 1
    /// - `exploration` - A customized [EpsilonGreedy] policy
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(config: QTableAgentConfig<D>) -> Self {
        Self::with_table(config, QTable::new(), 0)
    }

    /// Initialize a `QTableAgent` that resumes from a learned table after `episode` episodes
    pub fn with_table(config: QTableAgentConfig<D>, q_table: QTable<E::State>, episode: u32) -> Self {
        assert_interval!(config.alpha, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);
        Self {
            q_table,
            exploration: config.exploration,
            alpha: config.alpha,
            gamma: config.gamma,
            danger_filter: config.danger_filter,
            episode,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source used for exploration and tie breaking
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn get_q_table(&self) -> &QTable<E::State> {
        &self.q_table
    }

    pub fn into_q_table(self) -> QTable<E::State> {
        self.q_table
    }

    /// Episodes completed so far
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Exploration threshold of the current episode
    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon(self.episode)
    }

    /// Epsilon greedy action selection
    ///
    /// Explores uniformly over `actions` with probability `epsilon`, otherwise picks uniformly among the
    /// highest valued actions. With `danger_filter`, both draws are restricted to actions that are not
    /// hazards, unless every candidate is one. Unseen states count as all zero and are not inserted.
    ///
    /// **Panics** if `actions` is empty
    pub fn select_action(
        &mut self,
        state: &E::State,
        actions: &[E::Action],
        epsilon: f32,
        danger_filter: bool,
    ) -> E::Action {
        let candidates: Vec<E::Action> = match EpsilonGreedy::<D>::roll(epsilon, &mut self.rng) {
            Choice::Explore => actions.to_vec(),
            Choice::Exploit => {
                let values = self.q_table.values(state);
                let max = actions
                    .iter()
                    .map(|&a| values[Into::<usize>::into(a)])
                    .fold(f32::NEG_INFINITY, f32::max);
                actions
                    .iter()
                    .copied()
                    .filter(|&a| values[Into::<usize>::into(a)] == max)
                    .collect()
            }
        };

        let safe: Vec<E::Action> = candidates
            .iter()
            .copied()
            .filter(|&a| !danger_filter || !state.is_hazard(a))
            .collect();
        let pool = if safe.is_empty() { candidates } else { safe };

        match pool.as_slice() {
            [only] => *only,
            _ => *pool
                .choose(&mut self.rng)
                .expect("There is always at least one action available"),
        }
    }

    /// Temporal-difference update of `Q[state][action]`
    ///
    /// Ending moves still bootstrap from the state observed after them. Only `next_state = None`, where
    /// nothing is left to observe, uses the reward alone.
    pub fn update(
        &mut self,
        state: E::State,
        action: E::Action,
        reward: f32,
        next_state: Option<E::State>,
    ) {
        let max_next_q = next_state
            .map(|s| {
                self.q_table
                    .init_state(s)
                    .iter()
                    .copied()
                    .fold(f32::NEG_INFINITY, f32::max)
            })
            .unwrap_or(0.0);

        let q_value = &mut self.q_table.init_state(state)[Into::<usize>::into(action)];
        *q_value += self.alpha * (reward + self.gamma * max_next_q - *q_value);
    }

    /// Run one training episode: observe, act, transition, observe, learn
    pub fn go(&mut self, env: &mut E) -> Result<(), E::Error> {
        let epsilon = self.epsilon();
        let mut state = env.reset()?;
        self.q_table.init_state(state);

        loop {
            let actions = env.actions();
            let action = self.select_action(&state, &actions, epsilon, self.danger_filter);
            let (next_state, reward) = env.step(action)?;
            self.update(state, action, reward, next_state);

            match next_state {
                Some(next) if env.is_active() => state = next,
                _ => break,
            }
        }

        self.episode += 1;
        Ok(())
    }

    /// Run one greedy episode without learning, leaving the table untouched
    pub fn play(&mut self, env: &mut E) -> Result<(), E::Error> {
        let mut state = env.reset()?;

        while env.is_active() {
            let action = self.act(&state, &env.actions());
            match env.step(action)? {
                (Some(next), _) => state = next,
                (None, _) => break,
            }
        }

        Ok(())
    }

    /// Choose an action for `state` under the current exploration threshold and danger filter
    pub fn act(&mut self, state: &E::State, actions: &[E::Action]) -> E::Action {
        self.select_action(state, actions, self.epsilon(), self.danger_filter)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        decay::Constant,
        gym::{board::Board, vision::observe, Dir, Slither, SlitherConfig, VisionConfig, VisionState},
    };

    use super::*;

    type Agent = QTableAgent<Slither>;

    fn vision(snake: &[(i32, i32)]) -> VisionState {
        let board = Board::fixture(10, 10, snake, &[], (-1, -1));
        observe(&board, snake[0], &VisionConfig::default())
    }

    fn greedy(table: QTable<VisionState>, danger_filter: bool) -> QTableAgent<Slither, Constant> {
        QTableAgent::with_table(QTableAgentConfig::greedy(danger_filter), table, 0)
            .with_rng(StdRng::seed_from_u64(1))
    }

    const ACTIONS: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    #[test]
    fn exploits_unique_maximum() {
        let state = vision(&[(5, 5), (4, 5)]);
        let table = QTable::from_iter([(state, [0.1, 0.5, -0.3, 0.2])]);
        let mut agent = greedy(table, false);

        for _ in 0..100 {
            assert_eq!(agent.select_action(&state, &ACTIONS, 0.0, false), Dir::Right);
        }
    }

    #[test]
    fn breaks_ties_among_best_actions_only() {
        let state = vision(&[(5, 5), (4, 5)]);
        let table = QTable::from_iter([(state, [1.0, -1.0, 1.0, -1.0])]);
        let mut agent = greedy(table, false);

        let picks: Vec<Dir> = (0..200)
            .map(|_| agent.select_action(&state, &ACTIONS, 0.0, false))
            .collect();
        assert!(picks.iter().all(|d| matches!(d, Dir::Up | Dir::Down)));
        assert!(picks.contains(&Dir::Up) && picks.contains(&Dir::Down), "Ties broken at random");
    }

    #[test]
    fn danger_filter_prefers_safe_ties() {
        // Head in the top left corner: up and left are walls, right is free, down is free
        let state = vision(&[(0, 0)]);
        let mut agent = greedy(QTable::new(), true);

        for _ in 0..100 {
            let action = agent.select_action(&state, &ACTIONS, 0.0, true);
            assert!(matches!(action, Dir::Right | Dir::Down), "Avoids walls, got {action:?}");
        }
        assert!(agent.get_q_table().is_empty(), "Selecting does not insert rows");
    }

    #[test]
    fn danger_filter_explores_safely() {
        let state = vision(&[(0, 0)]);
        let mut agent = greedy(QTable::new(), true);

        for _ in 0..100 {
            let action = agent.select_action(&state, &ACTIONS, 1.0, true);
            assert!(matches!(action, Dir::Right | Dir::Down));
        }
    }

    #[test]
    fn danger_filter_falls_back_when_trapped() {
        // Boxed in by walls on the left and top, body right and below
        let state = vision(&[(0, 0), (1, 0), (1, 1), (0, 1)]);
        let table = QTable::from_iter([(state, [0.0, 0.0, 0.0, 3.0])]);
        let mut agent = greedy(table, true);

        assert_eq!(agent.select_action(&state, &ACTIONS, 0.0, true), Dir::Left);
    }

    #[test]
    fn bellman_update() {
        let config = QTableAgentConfig {
            alpha: 0.5,
            gamma: 0.9,
            ..Default::default()
        };
        let mut agent: Agent = QTableAgent::new(config);
        let state = vision(&[(5, 5)]);
        let next = vision(&[(6, 5), (5, 5)]);
        agent.q_table.insert(next, [1.0, 2.0, 0.0, -1.0]);

        agent.update(state, Dir::Right, 10.0, Some(next));
        // 0 + 0.5 * (10 + 0.9 * 2 - 0)
        let values = agent.get_q_table().values(&state);
        assert!((values[1] - 5.9).abs() < 1e-4, "Updated the chosen action");
        assert_eq!([values[0], values[2], values[3]], [0.0; 3], "Other actions untouched");

        agent.update(state, Dir::Right, -100.0, None);
        // 5.9 + 0.5 * (-100 - 5.9)
        assert!((agent.get_q_table().values(&state)[1] - -47.05).abs() < 1e-4);
    }

    #[test]
    fn wall_collision_bootstraps_from_the_observed_state() {
        let config = QTableAgentConfig {
            alpha: 0.5,
            gamma: 0.9,
            ..Default::default()
        };
        let mut agent: Agent = QTableAgent::new(config);
        let mut env = Slither::with_seed(SlitherConfig::default(), 2).unwrap();
        env.set_board(Board::fixture(10, 10, &[(9, 5), (8, 5), (7, 5)], &[(0, 0), (0, 1)], (0, 2)));

        let state = env.state().unwrap();
        agent.q_table.insert(state, [10.0, 0.0, 0.0, 0.0]);
        let (next, reward) = env.step(Dir::Right).unwrap();
        assert_eq!(next, Some(state), "The snake did not move");

        agent.update(state, Dir::Right, reward, next);
        // 0 + 0.5 * (-100 + 0.9 * 10 - 0)
        assert!((agent.get_q_table().values(&state)[1] - -45.5).abs() < 1e-4);
    }

    #[test]
    fn update_initializes_unseen_states() {
        let mut agent: Agent = QTableAgent::new(QTableAgentConfig::default());
        let state = vision(&[(5, 5)]);
        let next = vision(&[(5, 4), (5, 5)]);

        agent.update(state, Dir::Up, -0.1, Some(next));
        assert!(agent.get_q_table().contains(&state));
        assert!(agent.get_q_table().contains(&next));
        assert_eq!(agent.get_q_table().get(&next), Some(&[0.0; 4]));
    }

    #[test]
    fn training_grows_the_table() {
        let mut env = Slither::with_seed(SlitherConfig::default(), 5).unwrap();
        let mut agent: Agent = QTableAgent::new(QTableAgentConfig::default())
            .with_rng(StdRng::seed_from_u64(6));

        let mut sizes = Vec::new();
        for _ in 0..50 {
            agent.go(&mut env).unwrap();
            sizes.push(agent.get_q_table().len());
        }

        assert_eq!(agent.episode(), 50, "One episode per call");
        assert!(sizes.windows(2).all(|w| w[0] <= w[1]), "States are never evicted");
        assert!(!env.is_active(), "Episode ran to termination");
    }

    #[test]
    fn playing_leaves_the_table_alone() {
        let mut env = Slither::with_seed(SlitherConfig::default(), 8).unwrap();
        let mut trainer: Agent = QTableAgent::new(QTableAgentConfig::default())
            .with_rng(StdRng::seed_from_u64(9));
        for _ in 0..20 {
            trainer.go(&mut env).unwrap();
        }

        let table = trainer.into_q_table();
        let mut agent = greedy(table.clone(), true);
        for _ in 0..10 {
            agent.play(&mut env).unwrap();
        }

        assert_eq!(agent.get_q_table(), &table);
    }
}
