//! Phase 2: The Brain
//!
//! Responsible for:
//! - Bellman-Ford from the virtual source (potentials, negative cycles)
//! - Dijkstra on the reweighted graph, one run per source

mod bellman_ford;
mod dijkstra;
mod heap;
mod observer;

pub use bellman_ford::{BellmanFord, Potentials};
pub use dijkstra::{Dijkstra, DistanceTable};
pub use heap::IndexedMinHeap;
pub use observer::{RelaxationObserver, Silent, TraceObserver};

#[cfg(test)]
pub(crate) use observer::testing;

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether the caller has asked the running solve to stop.
pub(crate) fn cancelled(flag: Option<&AtomicBool>) -> bool {
    flag.is_some_and(|f| f.load(Ordering::Relaxed))
}
