//! Diagnostic tool - Check configuration and graph files
//!
//! Run with: cargo run --bin diagnose

use std::env;

use johnson_apsp::cartographer::{load_edge_list, GraphModel};
use johnson_apsp::ApspError;

fn main() {
    println!("🔍 JOHNSON APSP DIAGNOSTIC CHECK\n");

    // Load .env
    dotenvy::dotenv().ok();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("APSP_PARALLEL", "true", "Dijkstra passes on the rayon pool?"),
        ("APSP_WORKER_THREADS", "0", "Rayon threads (0 = one per core)"),
        ("APSP_MAX_CONCURRENT_GRAPHS", "1", "Graph files solved at once"),
        ("APSP_GRAPH_TIMEOUT_SECS", "0", "Per-graph deadline (0 = none)"),
        ("APSP_OUTPUT", "summary", "summary, table or json"),
        ("APSP_RESULTS_LOG", "false", "Append outcomes to a JSON-lines log?"),
        ("APSP_RESULTS_LOG_PATH", "./logs/apsp_results.jsonl", "Where the log goes"),
        ("APSP_TRACE_RELAXATIONS", "false", "Trace every round and settle?"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let marker = if env::var(key).is_err() { "(default)" } else { "(from env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    println!("═══════════════════════════════════════════════════");
    println!("                   GRAPH FILES                      ");
    println!("═══════════════════════════════════════════════════\n");

    let files = env::var("APSP_GRAPH_FILES").unwrap_or_default();
    let files: Vec<&str> = files
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();

    if files.is_empty() {
        println!("  APSP_GRAPH_FILES: NOT SET");
        println!("    └─ Pass files on the command line instead\n");
    }

    let mut unreadable = 0;
    let mut malformed = 0;
    for file in &files {
        let built = load_edge_list(file).and_then(|list| Ok(GraphModel::build(&list)?));
        match built {
            Ok(graph) => println!(
                "  ✅ {} ({} vertices, {} edges, cheapest edge {})",
                file,
                graph.vertex_count(),
                graph.edge_count(),
                graph
                    .min_edge_cost()
                    .map_or_else(|| "-".to_string(), |c| c.to_string())
            ),
            Err(e) if e.downcast_ref::<ApspError>().is_some() => {
                malformed += 1;
                println!("  ⚠️  {}: {:#}", file, e);
            }
            Err(e) => {
                unreadable += 1;
                println!("  ❌ {}: {:#}", file, e);
            }
        }
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                     STATUS                         ");
    println!("═══════════════════════════════════════════════════\n");

    let output = env::var("APSP_OUTPUT").unwrap_or_else(|_| "summary".to_string());
    match output.to_lowercase().as_str() {
        "summary" => println!("  📋 SUMMARY: shortest pair per graph, tables dropped"),
        "table" => println!("  📊 TABLE: full distance matrix per graph (memory grows with N²)"),
        "json" => println!("  🧾 JSON: reports on stdout, banner suppressed"),
        other => println!("  ❓ Unknown output mode: {}", other),
    }

    if unreadable > 0 {
        println!("\n  ⚠️  {} graph file(s) unreadable - they will be reported as failed", unreadable);
    }
    if malformed > 0 {
        println!("  ⚠️  {} graph file(s) malformed - they will be skipped", malformed);
    }

    println!("\n✅ Diagnostic complete!\n");
}
