//! Batch Driver
//!
//! Step 3.2: One orchestrator run per graph file
//!
//! Each file is loaded, built and solved on the blocking pool. A graph that
//! is malformed, has a negative cycle, or overruns its deadline is reported
//! and skipped; the rest of the batch carries on.

use chrono::{DateTime, Utc};
use eyre::Result;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::johnson::{AllPairs, Johnson, ShortestPair};
use crate::brain::{RelaxationObserver, Silent, TraceObserver};
use crate::cartographer::{load_edge_list, EdgeList, GraphModel, Source};
use crate::config::Config;
use crate::error::ApspError;

// ============================================
// REPORTS
// ============================================

/// How one graph file ended up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GraphOutcome {
    Solved {
        shortest: Option<ShortestPair>,
        vertices: usize,
        edges: usize,
        elapsed_ms: u64,
    },
    NegativeCycle {
        origin: Source,
    },
    Malformed {
        reason: String,
    },
    TimedOut {
        after_secs: u64,
    },
    Failed {
        reason: String,
    },
}

impl GraphOutcome {
    pub fn is_negative_cycle(&self) -> bool {
        matches!(self, GraphOutcome::NegativeCycle { .. })
    }

    pub fn shortest(&self) -> Option<ShortestPair> {
        match self {
            GraphOutcome::Solved { shortest, .. } => *shortest,
            _ => None,
        }
    }
}

/// Result for one graph file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphReport {
    pub timestamp: DateTime<Utc>,
    pub path: PathBuf,
    pub outcome: GraphOutcome,

    /// Full distance tables, kept only when the output needs them
    #[serde(skip)]
    pub all_pairs: Option<AllPairs>,
}

impl GraphReport {
    fn new(path: PathBuf, outcome: GraphOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            path,
            outcome,
            all_pairs: None,
        }
    }

    /// Append this report as one JSON line
    pub fn append_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let json = serde_json::to_string(self)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }
}

/// Everything a batch produced, in input order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub graphs: Vec<GraphReport>,
}

impl BatchReport {
    /// Shortest pair over every solved graph, with the graph it came from.
    pub fn overall_shortest(&self) -> Option<(&Path, ShortestPair)> {
        self.graphs
            .iter()
            .filter_map(|g| g.outcome.shortest().map(|s| (g.path.as_path(), s)))
            .fold(None, |best, (path, pair)| match best {
                Some((_, current)) if ShortestPair::min(Some(current), Some(pair)) == Some(current) => best,
                _ => Some((path, pair)),
            })
    }

    /// Per-graph flag: did a negative cycle abort this graph?
    pub fn negative_cycle_flags(&self) -> Vec<(&Path, bool)> {
        self.graphs
            .iter()
            .map(|g| (g.path.as_path(), g.outcome.is_negative_cycle()))
            .collect()
    }

    pub fn solved_count(&self) -> usize {
        self.graphs
            .iter()
            .filter(|g| matches!(g.outcome, GraphOutcome::Solved { .. }))
            .count()
    }
}

// ============================================
// RUNNER
// ============================================

/// How each graph is solved
#[derive(Debug, Clone, Copy, Default)]
struct SolveOptions {
    parallel: bool,
    keep_tables: bool,
    trace: bool,
}

/// Drives the orchestrator over a list of graph files
#[derive(Debug, Clone)]
pub struct BatchRunner {
    options: SolveOptions,
    concurrency: usize,
    timeout: Option<Duration>,
    results_log: Option<PathBuf>,
}

impl BatchRunner {
    pub fn from_config(config: &Config) -> Self {
        Self {
            options: SolveOptions {
                parallel: config.parallel,
                keep_tables: config.output.needs_tables(),
                trace: config.trace_relaxations,
            },
            concurrency: config.max_concurrent_graphs.max(1),
            timeout: config.graph_timeout(),
            results_log: config.results_log_path(),
        }
    }

    /// Solve every file, calling `on_done` as each report is ready.
    pub async fn run<F>(&self, files: &[PathBuf], on_done: F) -> BatchReport
    where
        F: Fn(&GraphReport),
    {
        let graphs: Vec<GraphReport> = stream::iter(files.iter().cloned())
            .map(|path| self.solve_file(path))
            .buffered(self.concurrency)
            .inspect(|report| {
                self.log_report(report);
                on_done(report);
            })
            .collect()
            .await;

        BatchReport { graphs }
    }

    async fn solve_file(&self, path: PathBuf) -> GraphReport {
        let cancel = Arc::new(AtomicBool::new(false));
        let task = {
            let (path, cancel, options) = (path.clone(), Arc::clone(&cancel), self.options);
            tokio::task::spawn_blocking(move || solve(&path, options, &cancel))
        };

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    // the solve sees the flag at its next round or source and returns
                    cancel.store(true, Ordering::Relaxed);
                    return GraphReport::new(
                        path,
                        GraphOutcome::TimedOut {
                            after_secs: limit.as_secs(),
                        },
                    );
                }
            },
            None => task.await,
        };

        match joined {
            Ok((outcome, all_pairs)) => GraphReport {
                all_pairs,
                ..GraphReport::new(path, outcome)
            },
            Err(e) => GraphReport::new(
                path,
                GraphOutcome::Failed {
                    reason: format!("solver task failed: {}", e),
                },
            ),
        }
    }

    fn log_report(&self, report: &GraphReport) {
        let name = report.path.display();
        match &report.outcome {
            GraphOutcome::Solved {
                shortest,
                elapsed_ms,
                ..
            } => match shortest {
                Some(pair) => info!(
                    "{}: shortest path {} -> {} = {} ({} ms)",
                    name, pair.source.0, pair.target.0, pair.distance, elapsed_ms
                ),
                None => info!("{}: empty graph ({} ms)", name, elapsed_ms),
            },
            GraphOutcome::NegativeCycle { origin } => {
                warn!("{}: negative cycle reachable from {}, Johnson aborted", name, origin)
            }
            GraphOutcome::Malformed { reason } => warn!("{}: malformed graph: {}", name, reason),
            GraphOutcome::TimedOut { after_secs } => {
                warn!("{}: abandoned after {}s deadline", name, after_secs)
            }
            GraphOutcome::Failed { reason } => error!("{}: {}", name, reason),
        }

        if let Some(log_path) = &self.results_log {
            if let Err(e) = report.append_to_file(log_path) {
                warn!("Could not append to results log {}: {}", log_path.display(), e);
            }
        }
    }
}

/// Load, build and solve one graph file. Runs on the blocking pool.
fn solve(path: &Path, options: SolveOptions, cancel: &AtomicBool) -> (GraphOutcome, Option<AllPairs>) {
    let list = match load_edge_list(path) {
        Ok(list) => list,
        Err(e) => {
            let outcome = match e.downcast_ref::<ApspError>() {
                Some(ApspError::MalformedInput(reason)) => GraphOutcome::Malformed {
                    reason: reason.clone(),
                },
                _ => GraphOutcome::Failed {
                    reason: e.chain().map(|c| c.to_string()).collect::<Vec<_>>().join(": "),
                },
            };
            return (outcome, None);
        }
    };

    match solve_list(&list, options, cancel) {
        Ok(solved) => solved,
        Err(ApspError::NegativeCycleDetected { origin }) => (GraphOutcome::NegativeCycle { origin }, None),
        Err(ApspError::MalformedInput(reason)) => (GraphOutcome::Malformed { reason }, None),
        Err(e) => (GraphOutcome::Failed { reason: e.to_string() }, None),
    }
}

fn solve_list(
    list: &EdgeList,
    options: SolveOptions,
    cancel: &AtomicBool,
) -> Result<(GraphOutcome, Option<AllPairs>), ApspError> {
    let start = Instant::now();
    let graph = GraphModel::build(list)?;
    let observer: &dyn RelaxationObserver = if options.trace { &TraceObserver } else { &Silent };
    let johnson = Johnson::new(&graph)
        .parallel(options.parallel)
        .with_observer(observer)
        .with_cancel(cancel);

    let (shortest, all_pairs) = if options.keep_tables {
        let all = johnson.run()?;
        (all.shortest(), Some(all))
    } else {
        (johnson.shortest()?, None)
    };

    let outcome = GraphOutcome::Solved {
        shortest,
        vertices: graph.vertex_count(),
        edges: graph.edge_count(),
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    Ok((outcome, all_pairs))
}
