//! Johnson APSP - all-pairs shortest paths with negative edge costs
//!
//! - `cartographer`: graph files in, weighted graph model out
//! - `brain`: Bellman-Ford potentials and Dijkstra on the reweighted graph
//! - `executor`: the Johnson pipeline and the batch driver over files

pub mod brain;
pub mod cartographer;
pub mod config;
pub mod error;
pub mod executor;

pub use error::ApspError;
