//! Loading strategies shipped with the crate.

pub mod graph;

pub use graph::{GraphError, GraphStrategy, StrategyEvent};
