//! Johnson APSP - all-pairs shortest paths with negative edge costs
//!
//! Run with: cargo run -- g1.txt g2.txt g3.txt
//!
//! For every graph file: Bellman-Ford from a virtual source (aborting on a
//! negative cycle), reweight, Dijkstra from every vertex, and report the
//! shortest of all shortest paths.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use johnson_apsp::cartographer::{Source, Vertex};
use johnson_apsp::config::{Config, OutputMode};
use johnson_apsp::executor::{AllPairs, BatchReport, BatchRunner, GraphOutcome, GraphReport, ShortestPair};
use johnson_apsp::ApspError;

#[derive(Parser, Debug)]
#[command(name = "johnson-apsp", version, about = "All-pairs shortest paths via Johnson's algorithm")]
struct Cli {
    /// Graph files in adjacency-list format (overrides APSP_GRAPH_FILES)
    files: Vec<PathBuf>,

    /// Read settings from a TOML file instead of the environment
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    output: Option<OutputMode>,

    /// Run the per-source Dijkstra passes one at a time
    #[arg(long)]
    sequential: bool,

    /// Rayon worker threads (0 = one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Abandon a graph after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Only print this source's row in table output
    #[arg(long)]
    source: Option<u32>,

    /// Log every relaxation round and settled vertex
    #[arg(long)]
    trace: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if !self.files.is_empty() {
            config.graph_files = self.files.clone();
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if self.sequential {
            config.parallel = false;
        }
        if let Some(threads) = self.threads {
            config.worker_threads = threads;
        }
        if let Some(timeout) = self.timeout {
            config.graph_timeout_secs = timeout;
        }
        if self.trace {
            config.trace_relaxations = true;
        }
    }
}

/// One graph in `--output json`, tables included when they were kept
#[derive(Serialize)]
struct JsonGraph<'a> {
    #[serde(flatten)]
    report: &'a GraphReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    all_pairs: Option<&'a AllPairs>,
}

/// Overall answer in `--output json`
#[derive(Serialize)]
struct JsonOverall<'a> {
    path: &'a Path,
    #[serde(flatten)]
    pair: ShortestPair,
}

#[derive(Serialize)]
struct JsonFlag<'a> {
    path: &'a Path,
    negative_cycle: bool,
}

#[derive(Serialize)]
struct JsonBatch<'a> {
    graphs: Vec<JsonGraph<'a>>,
    shortest: Option<JsonOverall<'a>>,
    negative_cycles: Vec<JsonFlag<'a>>,
}

impl<'a> JsonBatch<'a> {
    fn new(report: &'a BatchReport) -> Self {
        Self {
            graphs: report
                .graphs
                .iter()
                .map(|report| JsonGraph {
                    report,
                    all_pairs: report.all_pairs.as_ref(),
                })
                .collect(),
            shortest: report
                .overall_shortest()
                .map(|(path, pair)| JsonOverall { path, pair }),
            negative_cycles: report
                .negative_cycle_flags()
                .into_iter()
                .map(|(path, negative_cycle)| JsonFlag {
                    path,
                    negative_cycle,
                })
                .collect(),
        }
    }
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" JOHNSON APSP - All-Pairs Shortest Paths").cyan().bold()
    );
    println!(
        "{}",
        style("    Bellman-Ford potentials | Reweighting | Dijkstra per vertex").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn format_distance(distance: Option<i64>) -> String {
    distance.map_or_else(|| "∞".to_string(), |d| d.to_string())
}

fn print_table(all: &AllPairs, only: Option<Vertex>) -> Result<(), ApspError> {
    let rows: Vec<_> = match only {
        Some(source) => {
            let table = all
                .table(source)
                .ok_or(ApspError::SourceNotFound(Source::Real(source)))?;
            vec![(source, table)]
        }
        None => all.tables().collect(),
    };

    for (source, table) in rows {
        let cells: Vec<String> = table
            .iter()
            .map(|(_, d)| format!("{:>6}", format_distance(d)))
            .collect();
        println!("   {:>5} │{}", source.0, cells.join(""));
    }
    Ok(())
}

fn print_report(report: &BatchReport, config: &Config, only: Option<Vertex>) {
    println!();
    println!("{}", style("═══ RESULTS ═══").magenta().bold());
    println!();

    for graph in &report.graphs {
        let name = graph.path.display();
        match &graph.outcome {
            GraphOutcome::Solved {
                shortest,
                vertices,
                edges,
                elapsed_ms,
            } => {
                let shortest = match shortest {
                    Some(pair) => format!(
                        "{} → {} = {}",
                        pair.source.0,
                        pair.target.0,
                        style(pair.distance).green().bold()
                    ),
                    None => "empty graph".to_string(),
                };
                println!(
                    "{} {} ({} vertices, {} edges, {} ms): {}",
                    style("✓").green(),
                    style(&name).cyan(),
                    vertices,
                    edges,
                    elapsed_ms,
                    shortest
                );

                if config.output == OutputMode::Table {
                    if let Some(all) = &graph.all_pairs {
                        if let Err(e) = print_table(all, only) {
                            error!("{}: {}", name, e);
                        }
                    }
                }
            }
            GraphOutcome::NegativeCycle { origin } => println!(
                "{} {}: negative cycle reachable from {}, Johnson aborted",
                style("✗").red(),
                style(&name).cyan(),
                origin
            ),
            GraphOutcome::Malformed { reason } => println!(
                "{} {}: malformed graph ({})",
                style("✗").red(),
                style(&name).cyan(),
                reason
            ),
            GraphOutcome::TimedOut { after_secs } => println!(
                "{} {}: abandoned after {}s",
                style("⏱").yellow(),
                style(&name).cyan(),
                after_secs
            ),
            GraphOutcome::Failed { reason } => println!(
                "{} {}: {}",
                style("✗").red(),
                style(&name).cyan(),
                reason
            ),
        }
    }

    let aborted: Vec<String> = report
        .negative_cycle_flags()
        .into_iter()
        .filter(|&(_, flagged)| flagged)
        .map(|(path, _)| path.display().to_string())
        .collect();
    println!();
    if aborted.is_empty() {
        println!("{} No negative cycles", style("•").dim());
    } else {
        println!(
            "{} Negative cycles in {} of {} files: {}",
            style("⚠").yellow(),
            aborted.len(),
            report.graphs.len(),
            aborted.join(", ")
        );
    }

    match report.overall_shortest() {
        Some((path, pair)) => println!(
            "{} The shortest shortest path in all {} files is {} ({} → {} in {})",
            style("★").yellow().bold(),
            report.graphs.len(),
            style(pair.distance).green().bold(),
            pair.source.0,
            pair.target.0,
            path.display()
        ),
        None => println!(
            "{}",
            style("No graph produced a shortest path (all aborted or empty)").yellow()
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("johnson_apsp=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    cli.apply(&mut config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }

    let interactive = config.output != OutputMode::Json;
    if interactive {
        print_banner();
        config.print_summary();
        println!();
    }

    if config.worker_threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .build_global()
            .wrap_err("Failed to size the rayon pool")?;
    }

    let files = config.graph_files.clone();
    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▉░"),
    );

    info!("Solving {} graph files", files.len());
    let start = Instant::now();

    let runner = BatchRunner::from_config(&config);
    let report = runner
        .run(&files, |graph| {
            progress.set_message(graph.path.display().to_string());
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    info!(
        "Batch finished in {:?}: {}/{} graphs solved",
        start.elapsed(),
        report.solved_count(),
        report.graphs.len()
    );

    if interactive {
        print_report(&report, &config, cli.source.map(Vertex));
    } else {
        println!("{}", serde_json::to_string_pretty(&JsonBatch::new(&report))?);
    }

    Ok(())
}
