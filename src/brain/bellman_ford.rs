//! Bellman-Ford Algorithm
//!
//! Step 2.1: Potentials and negative-cycle detection
//!
//! Dynamic program over `A[i][v]`, the cheapest path from the source to
//! `v` using at most `i` edges:
//!
//! - `A[0][source] = 0`, every other label is infinity
//! - `A[i][v] = min(A[i-1][v], min over (u,v) of A[i-1][u] + cost(u,v))`
//!
//! Rows `1..N-1` are computed from the reverse adjacency, keeping only the
//! previous row. One extra check pass from row `N-1` decides whether a
//! negative cycle is reachable: if any label would still improve, it is.

use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use tracing::{debug, info, warn};

use petgraph::graph::NodeIndex;

use super::observer::{RelaxationObserver, SILENT};
use super::{cancelled, DistanceTable};
use crate::cartographer::{Cost, GraphModel, Source, Vertex};
use crate::error::ApspError;

/// Per-vertex shortest distances from the virtual source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Potentials(Vec<Cost>);

impl Potentials {
    pub fn get(&self, vertex: Vertex) -> Option<Cost> {
        self.at_index((vertex.0 as usize).checked_sub(1)?)
    }

    pub(crate) fn at_index(&self, index: usize) -> Option<Cost> {
        self.0.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vertex, Cost)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(i, &p)| (Vertex::from_index(i), p))
    }
}

impl From<Vec<Cost>> for Potentials {
    fn from(values: Vec<Cost>) -> Self {
        Potentials(values)
    }
}

/// Bellman-Ford over a graph model, virtual source included when present
pub struct BellmanFord<'a> {
    graph: &'a GraphModel,
    observer: &'a dyn RelaxationObserver,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> BellmanFord<'a> {
    pub fn new(graph: &'a GraphModel) -> Self {
        Self {
            graph,
            observer: &SILENT,
            cancel: None,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RelaxationObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Stop with `Cancelled` before the next round once `flag` is set.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Shortest distances from `source` to every real vertex.
    pub fn shortest_paths(&self, source: Source) -> Result<DistanceTable, ApspError> {
        let labels = self.relax(source)?;
        let distances = labels[..self.graph.vertex_count()].to_vec();
        Ok(DistanceTable::new(source, distances))
    }

    /// Potentials for reweighting: distances from the virtual source.
    pub fn potentials(&self) -> Result<Potentials, ApspError> {
        let labels = self.relax(Source::Virtual)?;
        // the virtual source reaches every vertex with a zero-cost edge
        let values = labels[..self.graph.vertex_count()]
            .iter()
            .map(|label| label.unwrap_or(0))
            .collect();
        Ok(Potentials(values))
    }

    fn relax(&self, source: Source) -> Result<Vec<Option<Cost>>, ApspError> {
        let origin = self
            .graph
            .locate(source)
            .ok_or(ApspError::SourceNotFound(source))?;

        let start = Instant::now();
        let n = self.graph.node_count();
        let mut prev: Vec<Option<Cost>> = vec![None; n];
        prev[origin.index()] = Some(0);
        let mut next = prev.clone();

        let mut rounds = 0;
        let mut converged = false;
        for round in 1..n {
            if cancelled(self.cancel) {
                debug!("Bellman-Ford from {} cancelled before round {}", source, round);
                return Err(ApspError::Cancelled);
            }
            let improved = self.round(&prev, &mut next);
            self.observer.on_round(source, round, improved);
            std::mem::swap(&mut prev, &mut next);
            rounds = round;
            if improved == 0 {
                converged = true;
                break;
            }
        }

        // a settled row cannot improve on the check pass
        if !converged {
            if let Some(node) = self.still_improving(&prev) {
                warn!(
                    "Negative cycle reachable from {} (label of {} still improving)",
                    source,
                    self.graph.node(node)
                );
                return Err(ApspError::NegativeCycleDetected { origin: source });
            }
        }

        info!(
            "Bellman-Ford from {}: {} rounds over {} nodes in {:?}",
            source,
            rounds,
            n,
            start.elapsed()
        );
        Ok(prev)
    }

    /// Compute row `i` into `next` from row `i-1` in `prev`.
    /// Returns how many labels improved.
    fn round(&self, prev: &[Option<Cost>], next: &mut [Option<Cost>]) -> usize {
        let mut improved = 0;
        for (index, slot) in next.iter_mut().enumerate() {
            let inherited = prev[index];
            let incoming = self.best_incoming(prev, NodeIndex::new(index));
            *slot = match (inherited, incoming) {
                (Some(current), Some(candidate)) if candidate < current => {
                    improved += 1;
                    Some(candidate)
                }
                (None, Some(candidate)) => {
                    improved += 1;
                    Some(candidate)
                }
                (current, _) => current,
            };
        }
        improved
    }

    /// Cheapest `A[u] + cost(u, node)` over incoming edges. Tails still at
    /// infinity are skipped rather than added to.
    fn best_incoming(&self, labels: &[Option<Cost>], node: NodeIndex) -> Option<Cost> {
        self.graph
            .incoming(node)
            .filter_map(|(tail, cost)| labels[tail.index()].map(|d| d + cost))
            .min()
    }

    /// First node whose label would still drop on one more pass.
    fn still_improving(&self, labels: &[Option<Cost>]) -> Option<NodeIndex> {
        let hit = (0..labels.len()).map(NodeIndex::new).find(|&node| {
            match (self.best_incoming(labels, node), labels[node.index()]) {
                (Some(candidate), Some(current)) => candidate < current,
                (Some(_), None) => true,
                (None, _) => false,
            }
        });
        if hit.is_none() {
            debug!("Check pass found no further improvement");
        }
        hit
    }
}
