//! Runtime Configuration
//!
//! Settings come from `APSP_*` environment variables (a `.env` file is
//! honoured), from a TOML file, and finally from command-line overrides.

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================
// OUTPUT MODE
// ============================================

/// What gets printed once the batch finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Shortest pair per graph plus the overall minimum
    #[default]
    Summary,

    /// Full distance matrix per graph
    Table,

    /// Machine-readable reports on stdout
    Json,
}

impl OutputMode {
    /// Whether the full all-pairs tables must be kept.
    pub fn needs_tables(self) -> bool {
        !matches!(self, OutputMode::Summary)
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::Summary => write!(f, "SUMMARY"),
            OutputMode::Table => write!(f, "TABLE"),
            OutputMode::Json => write!(f, "JSON"),
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputMode::Summary),
            "table" => Ok(OutputMode::Table),
            "json" => Ok(OutputMode::Json),
            other => Err(eyre::eyre!("Unknown output mode {:?}", other)),
        }
    }
}

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ========== Input ==========
    /// Graph files to solve, in order
    pub graph_files: Vec<PathBuf>,

    // ========== Execution ==========
    /// Run the per-source Dijkstra passes on the rayon pool
    pub parallel: bool,

    /// Rayon worker threads (0 = one per core)
    pub worker_threads: usize,

    /// Graph files solved at the same time
    pub max_concurrent_graphs: usize,

    /// Per-graph deadline in seconds (0 = none)
    pub graph_timeout_secs: u64,

    // ========== Output ==========
    pub output: OutputMode,

    /// Append every graph outcome to a JSON-lines log
    pub results_log: bool,

    pub results_log_path: String,

    /// Emit per-round / per-settle events through tracing
    pub trace_relaxations: bool,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            // Input
            graph_files: env::var("APSP_GRAPH_FILES")
                .map(|s| Self::parse_file_list(&s))
                .unwrap_or(defaults.graph_files),

            // Execution
            parallel: env::var("APSP_PARALLEL")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            worker_threads: env::var("APSP_WORKER_THREADS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(0),
            max_concurrent_graphs: env::var("APSP_MAX_CONCURRENT_GRAPHS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            graph_timeout_secs: env::var("APSP_GRAPH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(0),

            // Output
            output: match env::var("APSP_OUTPUT") {
                Ok(s) => s.parse().wrap_err("Invalid APSP_OUTPUT")?,
                Err(_) => OutputMode::Summary,
            },
            results_log: env::var("APSP_RESULTS_LOG")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            results_log_path: env::var("APSP_RESULTS_LOG_PATH")
                .unwrap_or(defaults.results_log_path),
            trace_relaxations: env::var("APSP_TRACE_RELAXATIONS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Comma-separated paths, blanks dropped
    fn parse_file_list(s: &str) -> Vec<PathBuf> {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    pub fn graph_timeout(&self) -> Option<Duration> {
        (self.graph_timeout_secs > 0).then(|| Duration::from_secs(self.graph_timeout_secs))
    }

    pub fn results_log_path(&self) -> Option<PathBuf> {
        self.results_log.then(|| PathBuf::from(&self.results_log_path))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.graph_files.is_empty() {
            return Err(eyre::eyre!(
                "No graph files given - pass them as arguments or set APSP_GRAPH_FILES"
            ));
        }
        if self.worker_threads > 512 {
            return Err(eyre::eyre!(
                "APSP_WORKER_THREADS should be at most 512 (currently {})",
                self.worker_threads
            ));
        }
        if self.max_concurrent_graphs == 0 {
            return Err(eyre::eyre!("APSP_MAX_CONCURRENT_GRAPHS must be at least 1"));
        }
        if self.results_log && self.results_log_path.trim().is_empty() {
            return Err(eyre::eyre!(
                "APSP_RESULTS_LOG is on but APSP_RESULTS_LOG_PATH is empty"
            ));
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              JOHNSON APSP - CONFIGURATION                  ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Graph Files:       {:^40} ║", self.graph_files.len());
        println!("║ Output:            {:^40} ║", self.output);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ EXECUTION                                                  ║");
        println!("║ • Parallel Dijkstra: {:^38} ║",
            if self.parallel { "✓ Enabled" } else { "✗ Sequential" }
        );
        println!("║ • Worker Threads:  {:^40} ║",
            if self.worker_threads == 0 { "auto".to_string() } else { self.worker_threads.to_string() }
        );
        println!("║ • Concurrent Graphs: {:^38} ║", self.max_concurrent_graphs);
        println!("║ • Graph Timeout:   {:^40} ║",
            if self.graph_timeout_secs == 0 { "none".to_string() } else { format!("{}s", self.graph_timeout_secs) }
        );
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ LOGGING                                                    ║");
        println!("║ • Results Log:     {:^40} ║",
            if self.results_log { "✓ Enabled" } else { "✗ Disabled" }
        );
        println!("║ • Relaxation Trace: {:^39} ║",
            if self.trace_relaxations { "✓ Enabled" } else { "✗ Disabled" }
        );
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph_files: vec![],
            parallel: true,
            worker_threads: 0,
            max_concurrent_graphs: 1,
            graph_timeout_secs: 0,
            output: OutputMode::Summary,
            results_log: false,
            results_log_path: "./logs/apsp_results.jsonl".to_string(),
            trace_relaxations: false,
        }
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output, OutputMode::Summary);
        assert!(config.parallel);
        assert_eq!(config.graph_timeout(), None);
        assert_eq!(config.results_log_path(), None);
    }

    #[test]
    fn test_validate_requires_graph_files() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.graph_files = vec![PathBuf::from("g1.txt")];
        assert!(config.validate().is_ok());

        config.max_concurrent_graphs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_list_parsing() {
        let files = Config::parse_file_list("g1.txt, g2.txt,,  g3.txt ");
        assert_eq!(
            files,
            vec![PathBuf::from("g1.txt"), PathBuf::from("g2.txt"), PathBuf::from("g3.txt")]
        );
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("JSON".parse::<OutputMode>().unwrap(), OutputMode::Json);
        assert_eq!("table".parse::<OutputMode>().unwrap(), OutputMode::Table);
        assert!("pretty".parse::<OutputMode>().is_err());
        assert!(!OutputMode::Summary.needs_tables());
        assert!(OutputMode::Table.needs_tables());
    }

    #[test]
    fn test_toml_file_with_partial_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apsp.toml");
        fs::write(
            &path,
            "graph_files = [\"g1.txt\", \"g2.txt\"]\ngraph_timeout_secs = 30\noutput = \"json\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.graph_files.len(), 2);
        assert_eq!(config.graph_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.output, OutputMode::Json);
        // unspecified fields fall back to defaults
        assert!(config.parallel);
        assert_eq!(config.max_concurrent_graphs, 1);

        let saved = dir.path().join("saved.toml");
        config.save_to_file(&saved).unwrap();
        assert_eq!(Config::from_file(&saved).unwrap().graph_timeout_secs, 30);
    }
}
