//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::config::AnalysisConfig;
use crate::Result;

/// Municipal crime-incident analysis: cleaning, monthly trends, and a
/// k-means map of incident locations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Optional TOML configuration file used as the base layer
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of clusters for the incident map
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,

    /// Seed for centroid initialization
    #[arg(long)]
    pub seed: Option<u64>,

    /// Random restarts kept by best within-cluster sum of squares
    #[arg(long)]
    pub restarts: Option<usize>,

    /// Maximum k-means iterations per restart
    #[arg(long)]
    pub max_iters: Option<u64>,

    /// Convergence tolerance for k-means
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Directory for rendered charts
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Scan cluster counts with a silhouette score and use the best
    #[arg(long)]
    pub select_k: bool,

    /// Upper bound for --select-k
    #[arg(long, default_value = "8")]
    pub k_max: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve the effective configuration: file values first, flags win.
    pub fn resolve_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(clusters) = self.clusters {
            config.clusters = clusters;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(restarts) = self.restarts {
            config.restarts = restarts;
        }
        if let Some(max_iters) = self.max_iters {
            config.max_iterations = max_iters;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        config.resolve_basemap_token();
        Ok(config)
    }
}
