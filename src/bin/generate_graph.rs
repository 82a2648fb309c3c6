//! Random graph generator
//!
//! Run with: cargo run --bin generate-graph -- --vertices 1000 --edges 47978 --seed 7 > g.txt
//!
//! Writes a graph in the input format: a `<vertices> <edges>` header, then
//! one `<tail> <head> <cost>` line per edge. Unless `--allow-cycles` is
//! passed, costs are shifted by a hidden potential so the graph has
//! negative edges but no negative cycle.

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use johnson_apsp::cartographer::{Cost, MAX_EDGE_COST};

/// Raw costs stay small enough that the potential shift keeps every edge in range.
const COST_BOUND: Cost = MAX_EDGE_COST / 4;

#[derive(Parser, Debug)]
#[command(name = "generate-graph", about = "Write a random directed graph with negative costs")]
struct Args {
    #[arg(long, short = 'n', default_value_t = 100)]
    vertices: u32,

    #[arg(long, short = 'm', default_value_t = 500)]
    edges: usize,

    /// Smallest raw edge cost
    #[arg(long, default_value_t = -10, allow_hyphen_values = true)]
    min_cost: Cost,

    /// Largest raw edge cost
    #[arg(long, default_value_t = 50)]
    max_cost: Cost,

    /// Seed for reproducible graphs
    #[arg(long)]
    seed: Option<u64>,

    /// Keep raw costs, negative cycles included
    #[arg(long)]
    allow_cycles: bool,

    /// Skip self-loops
    #[arg(long)]
    no_self_loops: bool,

    /// Output file (stdout if omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if args.vertices == 0 && args.edges > 0 {
        return Err(eyre!("Cannot place {} edges on an empty graph", args.edges));
    }
    if args.vertices == 1 && args.no_self_loops && args.edges > 0 {
        return Err(eyre!("A single vertex only has self-loops"));
    }
    let allowed = -COST_BOUND..=COST_BOUND;
    if !allowed.contains(&args.min_cost) || !allowed.contains(&args.max_cost) {
        return Err(eyre!("Costs must lie within ±{}", COST_BOUND));
    }
    if args.min_cost > args.max_cost {
        return Err(eyre!(
            "--min-cost {} is above --max-cost {}",
            args.min_cost,
            args.max_cost
        ));
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).wrap_err_with(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);

    // costs become w + h(head) - h(tail) with w >= 0, so every cycle sums to >= 0
    let spread = args.max_cost.abs().max(args.min_cost.abs()).max(1);
    let hidden: Vec<Cost> = (0..=args.vertices)
        .map(|_| rng.gen_range(-spread..=spread))
        .collect();

    writeln!(out, "{} {}", args.vertices, args.edges)?;
    for _ in 0..args.edges {
        let (tail, head) = loop {
            let tail = rng.gen_range(1..=args.vertices);
            let head = rng.gen_range(1..=args.vertices);
            if !(args.no_self_loops && tail == head) {
                break (tail, head);
            }
        };

        let cost = if args.allow_cycles {
            rng.gen_range(args.min_cost..=args.max_cost)
        } else {
            let w = rng.gen_range(0..=args.max_cost.max(0));
            w + hidden[head as usize] - hidden[tail as usize]
        };
        writeln!(out, "{} {} {}", tail, head, cost)?;
    }
    out.flush()?;

    Ok(())
}
