/// Tabular methods, which record a value for every state they encounter
pub mod tabular;

pub use tabular::q_table::{ActionValues, QTable, QTableAgent, QTableAgentConfig};
