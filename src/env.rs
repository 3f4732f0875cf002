use std::{
    collections::{hash_map::Entry, HashMap},
    ops::Index,
};

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space and action space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// The error raised when the environment cannot honor a request
    type Error;

    /// Determine if the state is active or terminal
    fn is_active(&self) -> bool;

    /// Update the environment in response to an action taken by an agent, producing a new state and associated reward
    ///
    /// **Returns** `(next_state, reward)`, where `next_state` is `None` if the action ended the episode
    fn step(&mut self, action: Self::Action) -> Result<(Option<Self::State>, f32), Self::Error>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Result<Self::State, Self::Error>;
}

/// An environment with a finite, enumerable set of actions
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions for the current state
    ///
    /// The returned vec should never be empty, instead specify an action that represents doing nothing if necessary.
    fn actions(&self) -> Vec<Self::Action>;
}

/// A state that can tell which actions lead straight into a fatal cell
pub trait Hazards<A> {
    fn is_hazard(&self, action: A) -> bool;
}

/// Per-episode metrics collected by an environment
///
/// Keys are fixed at construction and kept in insertion order so a report can be
/// fed straight into a plot or a CSV row.
#[derive(Debug, Clone)]
pub struct Report {
    keys: Vec<&'static str>,
    data: HashMap<&'static str, f64>,
}

impl Report {
    pub fn new(keys: Vec<&'static str>) -> Self {
        let data = keys.iter().map(|&k| (k, 0.0)).collect();
        Self { keys, data }
    }

    pub fn keys(&self) -> &[&'static str] {
        &self.keys
    }

    /// Access a metric, e.g. `report.entry("steps").and_modify(|x| *x += 1.0)`
    pub fn entry(&mut self, key: &'static str) -> Entry<'_, &'static str, f64> {
        self.data.entry(key)
    }

    pub fn set(&mut self, key: &'static str, value: f64) {
        if let Some(x) = self.data.get_mut(key) {
            *x = value;
        }
    }

    /// Metric values in key order
    pub fn values(&self) -> Vec<f64> {
        self.keys.iter().map(|k| self.data[k]).collect()
    }

    /// Take the current metrics, resetting every key to zero
    pub fn take(&mut self) -> Report {
        let fresh = Report::new(self.keys.clone());
        std::mem::replace(self, fresh)
    }
}

impl Index<&str> for Report {
    type Output = f64;

    fn index(&self, key: &str) -> &Self::Output {
        &self.data[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_take_resets() {
        let mut report = Report::new(vec!["steps", "reward"]);
        report.entry("steps").and_modify(|x| *x += 1.0);
        report.entry("steps").and_modify(|x| *x += 1.0);
        report.entry("reward").and_modify(|x| *x -= 0.5);

        assert_eq!(report.values(), [2.0, -0.5], "Values follow key order");

        let taken = report.take();
        assert_eq!(taken["steps"], 2.0, "Taken steps correct");
        assert_eq!(report["steps"], 0.0, "Report reset after take");
        assert_eq!(report.keys(), ["steps", "reward"], "Keys survive take");
    }

    #[test]
    fn report_set_ignores_unknown_keys() {
        let mut report = Report::new(vec!["length"]);
        report.set("length", 7.0);
        report.set("score", 1.0);
        assert_eq!(report["length"], 7.0);
        assert_eq!(report.values().len(), 1);
    }
}
