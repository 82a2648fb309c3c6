//! Phase 1: The Cartographer (Graph Ingest)
//!
//! Responsible for:
//! - Reading adjacency-list graph files into edge lists
//! - Building the weighted graph model the engines run on
//! - Attaching the virtual source and producing reweighted views

mod graph;
mod loader;

pub use graph::{AdjacencyView, Cost, Edge, GraphModel, Source, Vertex, MAX_EDGE_COST, MIN_EDGE_COST};
pub use loader::{load_edge_list, parse_edge_list, EdgeList};
