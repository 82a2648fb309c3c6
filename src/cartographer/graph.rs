//! Graph Model
//!
//! Step 1.2: The Map Maker
//!
//! A single petgraph `DiGraph` carries both directions of adjacency:
//! outgoing edges are the forward lists, incoming edges the reverse
//! lists, so the two can never drift apart. Costs are the edge weights.
//!
//! Real vertex `v` always lives at node index `v - 1`. The virtual source,
//! when added, is appended as the last node and tagged `Source::Virtual`.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, info, warn};

use super::EdgeList;
use crate::brain::Potentials;
use crate::error::ApspError;

/// Edge costs and path lengths.
pub type Cost = i64;

/// Edge costs are limited to 32 bits so that path sums, potentials and
/// reweighted costs over any graph that fits in memory stay inside `Cost`.
pub const MIN_EDGE_COST: Cost = i32::MIN as Cost;
pub const MAX_EDGE_COST: Cost = i32::MAX as Cost;

/// A real vertex, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vertex(pub u32);

impl Vertex {
    /// Zero-based slot in per-vertex tables. Only meaningful for real vertices.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn from_index(index: usize) -> Self {
        Vertex(index as u32 + 1)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vertex {}", self.0)
    }
}

/// A node as the engines see it: the auxiliary virtual source or a real vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Virtual,
    Real(Vertex),
}

impl Source {
    pub fn vertex(self) -> Option<Vertex> {
        match self {
            Source::Virtual => None,
            Source::Real(v) => Some(v),
        }
    }
}

impl From<Vertex> for Source {
    fn from(v: Vertex) -> Self {
        Source::Real(v)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Virtual => write!(f, "virtual source"),
            Source::Real(v) => write!(f, "{}", v),
        }
    }
}

/// Directed edge. Identity is the ordered pair; the cost is payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub tail: Vertex,
    pub head: Vertex,
    pub cost: Cost,
}

impl Edge {
    pub fn new(tail: u32, head: u32, cost: Cost) -> Self {
        Self {
            tail: Vertex(tail),
            head: Vertex(head),
            cost,
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.tail == other.tail && self.head == other.head
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tail.hash(state);
        self.head.hash(state);
    }
}

/// Read-only adjacency with costs, enough to run Dijkstra over.
pub trait AdjacencyView {
    fn vertex_count(&self) -> usize;

    fn contains(&self, vertex: Vertex) -> bool;

    /// Outgoing `(head, cost)` pairs of `vertex`.
    fn successors(&self, vertex: Vertex) -> impl Iterator<Item = (Vertex, Cost)> + '_;
}

/// The weighted digraph shared by every phase
#[derive(Debug, Clone)]
pub struct GraphModel {
    graph: DiGraph<Source, Cost>,
    vertex_count: usize,
    virtual_source: Option<NodeIndex>,
}

impl GraphModel {
    /// Build the model from a parsed edge list.
    ///
    /// Declared counts must match the supplied edges, every endpoint must
    /// lie in `1..=vertex_count` and every cost in
    /// `MIN_EDGE_COST..=MAX_EDGE_COST`; anything else is `MalformedInput`.
    pub fn build(list: &EdgeList) -> Result<Self, ApspError> {
        if list.edges.len() != list.edge_count {
            return Err(ApspError::malformed(format!(
                "header declares {} edges but {} were supplied",
                list.edge_count,
                list.edges.len()
            )));
        }
        // one node index stays free for the virtual source
        if list.vertex_count >= u32::MAX as usize {
            return Err(ApspError::malformed(format!(
                "{} vertices exceed the supported range",
                list.vertex_count
            )));
        }

        let n = list.vertex_count;
        let mut graph = DiGraph::with_capacity(n + 1, list.edges.len());
        for index in 0..n {
            graph.add_node(Source::Real(Vertex::from_index(index)));
        }

        let mut model = Self {
            graph,
            vertex_count: n,
            virtual_source: None,
        };

        let mut overwritten = 0usize;
        for edge in &list.edges {
            for endpoint in [edge.tail, edge.head] {
                if !model.contains(endpoint) {
                    return Err(ApspError::malformed(format!(
                        "edge ({}, {}) references vertex {} outside 1..={}",
                        edge.tail.0, edge.head.0, endpoint.0, n
                    )));
                }
            }
            if !(MIN_EDGE_COST..=MAX_EDGE_COST).contains(&edge.cost) {
                return Err(ApspError::malformed(format!(
                    "edge ({}, {}) costs {}, outside {}..={}",
                    edge.tail.0, edge.head.0, edge.cost, MIN_EDGE_COST, MAX_EDGE_COST
                )));
            }
            let tail = NodeIndex::new(edge.tail.index());
            let head = NodeIndex::new(edge.head.index());
            if model.insert(tail, head, edge.cost) {
                overwritten += 1;
            }
        }

        info!(
            "Graph built: {} vertices, {} edges",
            model.vertex_count,
            model.edge_count()
        );
        if overwritten > 0 {
            warn!("  {} repeated edges, last cost wins", overwritten);
        }

        Ok(model)
    }

    /// Add `tail -> head`. Parallel entries are kept in the adjacency but all
    /// take the new cost. Returns true if the pair was already present.
    fn insert(&mut self, tail: NodeIndex, head: NodeIndex, cost: Cost) -> bool {
        let parallel: Vec<EdgeIndex> = self
            .graph
            .edges_connecting(tail, head)
            .map(|e| e.id())
            .collect();
        for &id in &parallel {
            self.graph[id] = cost;
        }
        self.graph.add_edge(tail, head, cost);
        !parallel.is_empty()
    }

    /// Append the virtual source with a zero-cost edge to every real vertex.
    pub fn with_virtual_source(mut self) -> Self {
        if self.virtual_source.is_some() {
            warn!("Virtual source already present, graph left unchanged");
            return self;
        }

        let hub = self.graph.add_node(Source::Virtual);
        for index in 0..self.vertex_count {
            self.graph.add_edge(hub, NodeIndex::new(index), 0);
        }
        self.virtual_source = Some(hub);

        debug!("Virtual source attached to {} vertices", self.vertex_count);
        self
    }

    /// New model with `cost'(u,v) = cost(u,v) + p(u) - p(v)` on every real
    /// edge. The virtual source and its edges are not carried over.
    pub fn reweight(&self, potentials: &Potentials) -> Self {
        debug_assert_eq!(potentials.len(), self.vertex_count);

        let hub = self.virtual_source;
        let graph = self.graph.filter_map(
            |idx, node| (Some(idx) != hub).then_some(*node),
            |idx, &cost| {
                let (tail, head) = self.graph.edge_endpoints(idx)?;
                if Some(tail) == hub {
                    return None;
                }
                let shift = potentials.at_index(tail.index())? - potentials.at_index(head.index())?;
                Some(cost + shift)
            },
        );

        Self {
            graph,
            vertex_count: self.vertex_count,
            virtual_source: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of real edges, parallel entries included.
    pub fn edge_count(&self) -> usize {
        match self.virtual_source {
            Some(_) => self.graph.edge_count() - self.vertex_count,
            None => self.graph.edge_count(),
        }
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vertex> {
        (0..self.vertex_count).map(Vertex::from_index)
    }

    pub fn contains(&self, vertex: Vertex) -> bool {
        vertex.0 >= 1 && vertex.0 as usize <= self.vertex_count
    }

    pub fn has_virtual_source(&self) -> bool {
        self.virtual_source.is_some()
    }

    /// Current cost of the ordered pair, if the edge exists.
    pub fn cost(&self, tail: Source, head: Source) -> Option<Cost> {
        let tail = self.locate(tail)?;
        let head = self.locate(head)?;
        self.graph.find_edge(tail, head).map(|e| self.graph[e])
    }

    /// Forward adjacency of `tail`, in insertion order.
    pub fn heads(&self, tail: Source) -> Vec<Source> {
        self.neighbors(tail, Direction::Outgoing)
    }

    /// Reverse adjacency of `head`, in insertion order.
    pub fn tails(&self, head: Source) -> Vec<Source> {
        self.neighbors(head, Direction::Incoming)
    }

    fn neighbors(&self, at: Source, dir: Direction) -> Vec<Source> {
        let Some(node) = self.locate(at) else {
            return Vec::new();
        };
        // petgraph walks adjacency newest-first
        let mut out: Vec<Source> = self
            .graph
            .edges_directed(node, dir)
            .map(|e| match dir {
                Direction::Outgoing => self.graph[e.target()],
                Direction::Incoming => self.graph[e.source()],
            })
            .collect();
        out.reverse();
        out
    }

    /// Cheapest real edge, or `None` for an edgeless graph.
    pub fn min_edge_cost(&self) -> Option<Cost> {
        self.graph
            .edge_references()
            .filter(|e| Some(e.source()) != self.virtual_source)
            .map(|e| *e.weight())
            .min()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn locate(&self, source: Source) -> Option<NodeIndex> {
        match source {
            Source::Virtual => self.virtual_source,
            Source::Real(v) => self.contains(v).then(|| NodeIndex::new(v.index())),
        }
    }

    pub(crate) fn node(&self, node: NodeIndex) -> Source {
        self.graph[node]
    }

    /// Incoming `(tail, cost)` pairs of `node`, the virtual source included.
    pub(crate) fn incoming(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, Cost)> + '_ {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), *e.weight()))
    }
}

impl AdjacencyView for GraphModel {
    fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    fn contains(&self, vertex: Vertex) -> bool {
        GraphModel::contains(self, vertex)
    }

    fn successors(&self, vertex: Vertex) -> impl Iterator<Item = (Vertex, Cost)> + '_ {
        self.graph
            .edges(NodeIndex::new(vertex.index()))
            .filter_map(|e| match self.graph[e.target()] {
                Source::Real(head) => Some((head, *e.weight())),
                Source::Virtual => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(v: u32) -> Source {
        Source::Real(Vertex(v))
    }

    fn sample() -> EdgeList {
        EdgeList::new(
            4,
            vec![
                Edge::new(1, 2, 1),
                Edge::new(2, 3, 2),
                Edge::new(2, 4, -3),
            ],
        )
    }

    #[test]
    fn test_build_forward_and_reverse_agree() {
        let graph = GraphModel::build(&sample()).unwrap();

        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.heads(real(1)), vec![real(2)]);
        assert_eq!(graph.heads(real(2)), vec![real(3), real(4)]);
        assert_eq!(graph.tails(real(4)), vec![real(2)]);
        assert!(graph.tails(real(1)).is_empty());
        assert_eq!(graph.cost(real(2), real(4)), Some(-3));
        assert_eq!(graph.cost(real(4), real(2)), None);

        for tail in graph.vertices() {
            for head in graph.heads(tail.into()) {
                assert!(graph.tails(head).contains(&tail.into()));
            }
        }
    }

    #[test]
    fn test_build_rejects_out_of_range_vertex() {
        let list = EdgeList::new(3, vec![Edge::new(1, 4, 1)]);
        let err = GraphModel::build(&list).unwrap_err();
        assert!(matches!(err, ApspError::MalformedInput(_)));

        let list = EdgeList::new(3, vec![Edge::new(0, 2, 1)]);
        assert!(GraphModel::build(&list).is_err());
    }

    #[test]
    fn test_build_rejects_costs_outside_32_bits() {
        let list = EdgeList::new(3, vec![Edge::new(1, 2, 5_000_000_000_000_000_000), Edge::new(2, 3, 1)]);
        let err = GraphModel::build(&list).unwrap_err();
        assert!(matches!(err, ApspError::MalformedInput(_)));
        assert!(err.to_string().contains("edge (1, 2)"), "{}", err);

        let list = EdgeList::new(2, vec![Edge::new(1, 2, MIN_EDGE_COST - 1)]);
        assert!(GraphModel::build(&list).is_err());

        let list = EdgeList::new(2, vec![Edge::new(1, 2, MIN_EDGE_COST), Edge::new(2, 1, MAX_EDGE_COST)]);
        assert!(GraphModel::build(&list).is_ok());
    }

    #[test]
    fn test_build_leaves_room_for_virtual_source() {
        let list = EdgeList::new(u32::MAX as usize, vec![]);
        let err = GraphModel::build(&list).unwrap_err();
        assert!(matches!(err, ApspError::MalformedInput(_)));
    }

    #[test]
    fn test_build_rejects_edge_count_mismatch() {
        let mut list = sample();
        list.edge_count = 5;
        let err = GraphModel::build(&list).unwrap_err();
        assert!(err.to_string().contains("declares 5 edges"));
    }

    #[test]
    fn test_repeated_edge_keeps_adjacency_last_cost_wins() {
        let list = EdgeList::new(2, vec![Edge::new(1, 2, 7), Edge::new(1, 2, 4)]);
        let graph = GraphModel::build(&list).unwrap();

        assert_eq!(graph.heads(real(1)), vec![real(2), real(2)]);
        assert_eq!(graph.tails(real(2)).len(), 2);
        assert_eq!(graph.cost(real(1), real(2)), Some(4));
        assert!(graph.successors(Vertex(1)).all(|(_, c)| c == 4));
    }

    #[test]
    fn test_edge_identity_ignores_cost() {
        assert_eq!(Edge::new(1, 2, 5), Edge::new(1, 2, -9));
        assert_ne!(Edge::new(1, 2, 5), Edge::new(2, 1, 5));
    }

    #[test]
    fn test_virtual_source_edges() {
        let graph = GraphModel::build(&sample()).unwrap().with_virtual_source();

        assert!(graph.has_virtual_source());
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.heads(Source::Virtual).len(), 4);
        for v in graph.vertices() {
            assert_eq!(graph.cost(Source::Virtual, v.into()), Some(0));
            assert!(graph.tails(v.into()).contains(&Source::Virtual));
        }
        // the virtual source never shows up as a real successor
        assert!(graph.vertices().all(|v| graph.successors(v).count() == graph.heads(v.into()).len()));
    }

    #[test]
    fn test_virtual_source_twice_is_ignored() {
        let graph = GraphModel::build(&sample())
            .unwrap()
            .with_virtual_source()
            .with_virtual_source();
        assert_eq!(graph.heads(Source::Virtual).len(), 4);
        assert_eq!(graph.node_count(), 5);
    }

    #[test]
    fn test_reweight_is_pure_and_drops_virtual_source() {
        let graph = GraphModel::build(&sample()).unwrap().with_virtual_source();
        let potentials = Potentials::from(vec![0, 1, -2, 5]);

        let reweighted = graph.reweight(&potentials);

        assert!(!reweighted.has_virtual_source());
        assert_eq!(reweighted.edge_count(), 3);
        // 1 + 0 - 1, 2 + 1 - (-2), -3 + 1 - 5
        assert_eq!(reweighted.cost(real(1), real(2)), Some(0));
        assert_eq!(reweighted.cost(real(2), real(3)), Some(5));
        assert_eq!(reweighted.cost(real(2), real(4)), Some(-7));
        // source model untouched
        assert_eq!(graph.cost(real(2), real(4)), Some(-3));
        assert!(graph.has_virtual_source());
    }

    #[test]
    fn test_min_edge_cost_ignores_virtual_edges() {
        let list = EdgeList::new(2, vec![Edge::new(1, 2, 3)]);
        let graph = GraphModel::build(&list).unwrap().with_virtual_source();
        assert_eq!(graph.min_edge_cost(), Some(3));

        let empty = GraphModel::build(&EdgeList::new(2, vec![])).unwrap();
        assert_eq!(empty.min_edge_cost(), None);
    }
}
