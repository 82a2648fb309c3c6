//! Phase 3: The Executor
//!
//! Responsible for:
//! - Sequencing Bellman-Ford, reweighting and the per-source Dijkstra runs
//! - Driving that pipeline over a batch of graph files

mod batch;
mod johnson;

pub use batch::{BatchReport, BatchRunner, GraphOutcome, GraphReport};
pub use johnson::{AllPairs, Johnson, Reweighted, ShortestPair};
