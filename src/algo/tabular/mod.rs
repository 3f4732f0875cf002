//! Agents that keep one row of action values per visited state

pub mod q_table;

/// A state usable as a table key: small, copied freely and hashed by value
pub trait Hashable: Copy + Eq + std::hash::Hash {}

impl<T: Copy + Eq + std::hash::Hash> Hashable for T {}
