//! Johnson's Algorithm
//!
//! Step 3.1: The Orchestrator
//!
//! 1. Attach the virtual source and run Bellman-Ford from it
//! 2. Reweight every real edge with the resulting potentials
//! 3. Run Dijkstra once per vertex on the reweighted graph
//! 4. Translate distances back to true costs and aggregate
//!
//! A negative cycle stops the pipeline after step 1. The per-source runs
//! share the reweighted graph read-only and may run on the rayon pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use tracing::{debug, info};

use crate::brain::{cancelled, BellmanFord, Dijkstra, DistanceTable, Potentials, RelaxationObserver, Silent};
use crate::cartographer::{Cost, GraphModel, Vertex};
use crate::error::ApspError;

/// One ordered pair and its shortest distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortestPair {
    pub source: Vertex,
    pub target: Vertex,
    pub distance: Cost,
}

impl ShortestPair {
    fn order_key(&self) -> (Cost, Vertex, Vertex) {
        (self.distance, self.source, self.target)
    }

    /// The smaller of two optional pairs, ties broken by vertex order.
    pub fn min(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(if b.order_key() < a.order_key() { b } else { a }),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/// Full `source -> (vertex -> distance)` answer
#[derive(Debug, Clone, Default, Serialize)]
pub struct AllPairs {
    tables: BTreeMap<Vertex, DistanceTable>,
}

impl AllPairs {
    pub fn table(&self, source: Vertex) -> Option<&DistanceTable> {
        self.tables.get(&source)
    }

    pub fn distance(&self, source: Vertex, target: Vertex) -> Option<Cost> {
        self.tables.get(&source)?.get(target)
    }

    pub fn tables(&self) -> impl Iterator<Item = (Vertex, &DistanceTable)> + '_ {
        self.tables.iter().map(|(&s, t)| (s, t))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Minimum finite distance over all ordered pairs, `(s, s)` included.
    pub fn shortest(&self) -> Option<ShortestPair> {
        self.tables
            .iter()
            .map(|(&source, table)| shortest_in(source, table))
            .fold(None, ShortestPair::min)
    }
}

fn shortest_in(source: Vertex, table: &DistanceTable) -> Option<ShortestPair> {
    table
        .shortest()
        .map(|(target, distance)| ShortestPair {
            source,
            target,
            distance,
        })
}

/// Output of the Bellman-Ford and reweighting phases
#[derive(Debug, Clone)]
pub struct Reweighted {
    /// Real vertices only, every cost non-negative
    pub graph: GraphModel,
    pub potentials: Potentials,
}

/// All-pairs shortest paths orchestrator
pub struct Johnson<'a> {
    graph: &'a GraphModel,
    observer: &'a dyn RelaxationObserver,
    parallel: bool,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Johnson<'a> {
    pub fn new(graph: &'a GraphModel) -> Self {
        Self {
            graph,
            observer: &Silent,
            parallel: false,
            cancel: None,
        }
    }

    /// Dispatch the per-source Dijkstra runs on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn RelaxationObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Give up with `Cancelled` once `flag` is set. Checked between
    /// Bellman-Ford rounds and before each per-source Dijkstra run.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Potentials from the virtual source and the reweighted graph.
    pub fn prepare(&self) -> Result<Reweighted, ApspError> {
        let start = Instant::now();
        let augmented = self.graph.clone().with_virtual_source();
        let mut engine = BellmanFord::new(&augmented).with_observer(self.observer);
        if let Some(flag) = self.cancel {
            engine = engine.with_cancel(flag);
        }
        let potentials = engine.potentials()?;

        let graph = augmented.reweight(&potentials);
        debug_assert!(graph.min_edge_cost().map_or(true, |c| c >= 0));

        debug!(
            "Reweighted {} edges in {:?} (cheapest now {:?})",
            graph.edge_count(),
            start.elapsed(),
            graph.min_edge_cost()
        );
        Ok(Reweighted { graph, potentials })
    }

    /// Every source's full distance table.
    pub fn run(&self) -> Result<AllPairs, ApspError> {
        let prepared = self.prepare()?;
        let tables = self.per_source(&prepared, |source, table| (source, table))?;
        Ok(AllPairs {
            tables: tables.into_iter().collect(),
        })
    }

    /// Only the single shortest pair, without keeping the tables around.
    pub fn shortest(&self) -> Result<Option<ShortestPair>, ApspError> {
        let prepared = self.prepare()?;
        let per_source = self.per_source(&prepared, |source, table| shortest_in(source, &table))?;
        Ok(per_source.into_iter().fold(None, ShortestPair::min))
    }

    fn solve_from(&self, prepared: &Reweighted, source: Vertex) -> Result<DistanceTable, ApspError> {
        if cancelled(self.cancel) {
            return Err(ApspError::Cancelled);
        }
        let table = Dijkstra::new(&prepared.graph)
            .with_observer(self.observer)
            .shortest_paths(source)?;
        Ok(table.unreweight(&prepared.potentials))
    }

    fn per_source<T, F>(&self, prepared: &Reweighted, reduce: F) -> Result<Vec<T>, ApspError>
    where
        T: Send,
        F: Fn(Vertex, DistanceTable) -> T + Send + Sync,
    {
        let start = Instant::now();
        let sources: Vec<Vertex> = self.graph.vertices().collect();
        let solve = |&source: &Vertex| {
            self.solve_from(prepared, source)
                .map(|table| reduce(source, table))
        };

        let results = if self.parallel {
            sources.par_iter().map(solve).collect::<Result<Vec<_>, _>>()?
        } else {
            sources.iter().map(solve).collect::<Result<Vec<_>, _>>()?
        };

        info!(
            "Dijkstra from {} sources{} in {:?}",
            sources.len(),
            if self.parallel { " (parallel)" } else { "" },
            start.elapsed()
        );
        Ok(results)
    }
}
