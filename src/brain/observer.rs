//! Relaxation observers
//!
//! The engines never print. They report progress to an observer at round
//! and settle boundaries; the default observer does nothing.

use tracing::{debug, trace};

use crate::cartographer::{Cost, Source, Vertex};

/// Hooks invoked from inside the shortest-path loops.
///
/// Implementations are shared across the per-source Dijkstra runs, which
/// may execute on several threads at once.
pub trait RelaxationObserver: Send + Sync {
    /// A Bellman-Ford round finished; `improved` labels changed in it.
    fn on_round(&self, _source: Source, _round: usize, _improved: usize) {}

    /// Dijkstra fixed the final distance of `vertex`.
    fn on_settle(&self, _source: Vertex, _vertex: Vertex, _distance: Cost) {}

    /// A Dijkstra run from `source` completed.
    fn on_source_done(&self, _source: Vertex, _reachable: usize) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl RelaxationObserver for Silent {}

/// Observer that forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceObserver;

impl RelaxationObserver for TraceObserver {
    fn on_round(&self, source: Source, round: usize, improved: usize) {
        debug!("Bellman-Ford from {}: round {} improved {} labels", source, round, improved);
    }

    fn on_settle(&self, source: Vertex, vertex: Vertex, distance: Cost) {
        trace!("Dijkstra from {}: settled {} at {}", source, vertex, distance);
    }

    fn on_source_done(&self, source: Vertex, reachable: usize) {
        debug!("Dijkstra from {} done, {} vertices reachable", source, reachable);
    }
}

/// Shared no-op instance used when no observer is supplied.
pub(crate) static SILENT: Silent = Silent;

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every event for assertions.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub rounds: Mutex<Vec<(usize, usize)>>,
        pub settled: Mutex<Vec<(Vertex, Vertex, Cost)>>,
        pub finished: Mutex<Vec<Vertex>>,
    }

    impl RelaxationObserver for Recorder {
        fn on_round(&self, _source: Source, round: usize, improved: usize) {
            self.rounds.lock().unwrap().push((round, improved));
        }

        fn on_settle(&self, source: Vertex, vertex: Vertex, distance: Cost) {
            self.settled.lock().unwrap().push((source, vertex, distance));
        }

        fn on_source_done(&self, source: Vertex, _reachable: usize) {
            self.finished.lock().unwrap().push(source);
        }
    }
}
