//! Dijkstra's algorithm over an indexed heap
//!
//! Step 2.2: Single-source distances on non-negative costs
//!
//! Every vertex starts queued at "infinity" except the source at 0.
//! Extracting a vertex fixes its distance for good; its unresolved
//! successors then get their keys decreased in place. Negative costs break
//! the greedy argument and silently produce wrong answers, so callers
//! reweight first.

use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use super::heap::IndexedMinHeap;
use super::observer::{RelaxationObserver, SILENT};
use super::Potentials;
use crate::cartographer::{AdjacencyView, Cost, Source, Vertex};
use crate::error::ApspError;

/// Heap key for vertices not reached yet.
const UNREACHED: Cost = Cost::MAX;

/// Distances from one source, indexed by vertex. `None` is "infinity".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistanceTable {
    source: Source,
    distances: Vec<Option<Cost>>,
}

impl DistanceTable {
    pub(crate) fn new(source: Source, distances: Vec<Option<Cost>>) -> Self {
        Self { source, distances }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Distance to `vertex`, `None` if unreachable or not in the graph.
    pub fn get(&self, vertex: Vertex) -> Option<Cost> {
        let index = (vertex.0 as usize).checked_sub(1)?;
        self.distances.get(index).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vertex, Option<Cost>)> + '_ {
        self.distances
            .iter()
            .enumerate()
            .map(|(i, d)| (Vertex::from_index(i), *d))
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn reachable_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_some()).count()
    }

    /// Smallest finite entry, the source's own distance included.
    pub fn shortest(&self) -> Option<(Vertex, Cost)> {
        self.iter()
            .filter_map(|(v, d)| d.map(|d| (v, d)))
            .min_by_key(|&(v, d)| (d, v))
    }

    /// Translate reweighted distances back to true costs:
    /// `d(s,v) = d'(s,v) - p(s) + p(v)`. Unreachable entries stay `None`.
    pub fn unreweight(mut self, potentials: &Potentials) -> Self {
        let Some(source) = self.source.vertex() else {
            return self;
        };
        let Some(p_source) = potentials.get(source) else {
            return self;
        };

        for (index, entry) in self.distances.iter_mut().enumerate() {
            if let (Some(d), Some(p_target)) = (*entry, potentials.at_index(index)) {
                *entry = Some(d - p_source + p_target);
            }
        }
        self
    }
}

/// Single-source shortest paths over any non-negative adjacency view
pub struct Dijkstra<'a, G: AdjacencyView> {
    graph: &'a G,
    observer: &'a dyn RelaxationObserver,
}

impl<'a, G: AdjacencyView> Dijkstra<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        Self {
            graph,
            observer: &SILENT,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RelaxationObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn shortest_paths(&self, source: Vertex) -> Result<DistanceTable, ApspError> {
        if !self.graph.contains(source) {
            return Err(ApspError::SourceNotFound(Source::Real(source)));
        }

        let start = Instant::now();
        let n = self.graph.vertex_count();
        let mut heap = IndexedMinHeap::with_capacity(n);
        for index in 0..n {
            heap.push(index, UNREACHED);
        }
        heap.decrease_key(source.index(), 0);

        let mut distances = vec![None; n];
        while let Some((index, distance)) = heap.pop() {
            // everything left in the heap is unreachable
            if distance == UNREACHED {
                break;
            }

            let vertex = Vertex::from_index(index);
            distances[index] = Some(distance);
            self.observer.on_settle(source, vertex, distance);

            for (head, cost) in self.graph.successors(vertex) {
                let Some(current) = heap.key(head.index()) else {
                    continue;
                };
                let Some(candidate) = distance.checked_add(cost) else {
                    continue;
                };
                if candidate < current {
                    heap.decrease_key(head.index(), candidate);
                }
            }
        }

        let table = DistanceTable::new(Source::Real(source), distances);
        self.observer.on_source_done(source, table.reachable_count());
        debug!(
            "Dijkstra from {}: {} of {} reachable in {:?}",
            source,
            table.reachable_count(),
            n,
            start.elapsed()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::observer::testing::Recorder;
    use crate::cartographer::{Edge, EdgeList, GraphModel};

    fn graph(n: usize, edges: &[(u32, u32, Cost)]) -> GraphModel {
        let edges = edges.iter().map(|&(t, h, c)| Edge::new(t, h, c)).collect();
        GraphModel::build(&EdgeList::new(n, edges)).unwrap()
    }

    #[test]
    fn test_shortest_paths_known_fixture() {
        let g = graph(4, &[(1, 2, 1), (2, 3, 5), (2, 4, 11), (3, 4, 8), (4, 2, 3)]);
        let table = Dijkstra::new(&g).shortest_paths(Vertex(1)).unwrap();

        assert_eq!(table.get(Vertex(1)), Some(0));
        assert_eq!(table.get(Vertex(2)), Some(1));
        assert_eq!(table.get(Vertex(3)), Some(6));
        assert_eq!(table.get(Vertex(4)), Some(12));
    }

    #[test]
    fn test_different_source_same_graph() {
        let g = graph(4, &[(1, 2, 1), (2, 3, 5), (2, 4, 11), (3, 4, 8), (4, 2, 3)]);
        let table = Dijkstra::new(&g).shortest_paths(Vertex(2)).unwrap();

        assert_eq!(table.get(Vertex(1)), None);
        assert_eq!(table.get(Vertex(3)), Some(5));
        assert_eq!(table.get(Vertex(4)), Some(11));
        assert_eq!(table.reachable_count(), 3);
    }

    #[test]
    fn test_decrease_key_finds_cheaper_detour() {
        let g = graph(3, &[(1, 2, 10), (1, 3, 1), (3, 2, 2)]);
        let table = Dijkstra::new(&g).shortest_paths(Vertex(1)).unwrap();
        assert_eq!(table.get(Vertex(2)), Some(3));
    }

    #[test]
    fn test_unreachable_vertices_stay_infinite() {
        let g = graph(5, &[(1, 2, 4), (3, 4, 1)]);
        let table = Dijkstra::new(&g).shortest_paths(Vertex(1)).unwrap();

        assert_eq!(table.get(Vertex(2)), Some(4));
        assert_eq!(table.get(Vertex(3)), None);
        assert_eq!(table.get(Vertex(5)), None);
        // the source reaches itself at 0
        assert_eq!(table.shortest(), Some((Vertex(1), 0)));
    }

    #[test]
    fn test_relaxation_never_overflows() {
        use crate::cartographer::MAX_EDGE_COST;

        let n = 40;
        let edges: Vec<_> = (1..n).map(|v| (v, v + 1, MAX_EDGE_COST)).collect();
        let g = graph(n as usize, &edges);
        let table = Dijkstra::new(&g).shortest_paths(Vertex(1)).unwrap();

        assert_eq!(table.get(Vertex(n)), Some(MAX_EDGE_COST * (n as Cost - 1)));
        assert_eq!(table.reachable_count(), n as usize);
    }

    #[test]
    fn test_missing_source() {
        let g = graph(2, &[(1, 2, 1)]);
        let err = Dijkstra::new(&g).shortest_paths(Vertex(3)).unwrap_err();
        assert_eq!(err, ApspError::SourceNotFound(Source::Real(Vertex(3))));
    }

    #[test]
    fn test_settled_distances_never_change() {
        let g = graph(4, &[(1, 2, 2), (1, 3, 1), (3, 2, 1), (2, 4, 0), (3, 4, 5)]);
        let recorder = Recorder::default();
        let table = Dijkstra::new(&g)
            .with_observer(&recorder)
            .shortest_paths(Vertex(1))
            .unwrap();

        let settled = recorder.settled.lock().unwrap();
        assert_eq!(settled.len(), 4);
        for &(_, vertex, distance) in settled.iter() {
            assert_eq!(table.get(vertex), Some(distance));
        }
        // extraction order is non-decreasing in distance
        assert!(settled.windows(2).all(|w| w[0].2 <= w[1].2));
        assert_eq!(*recorder.finished.lock().unwrap(), vec![Vertex(1)]);
    }

    #[test]
    fn test_unreweight_translates_finite_entries_only() {
        let table = DistanceTable::new(Source::Real(Vertex(1)), vec![Some(0), Some(4), None]);
        let potentials = Potentials::from(vec![-1, -3, 0]);

        let table = table.unreweight(&potentials);
        assert_eq!(table.get(Vertex(1)), Some(0));
        // 4 - (-1) + (-3)
        assert_eq!(table.get(Vertex(2)), Some(2));
        assert_eq!(table.get(Vertex(3)), None);
    }
}
