//! Run configuration: analysis knobs and the external basemap collaborator.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::model::ClusterParams;
use crate::Result;

/// Environment variable consulted for the basemap credential when the
/// configuration file does not supply one.
pub const BASEMAP_TOKEN_VAR: &str = "CRIMEATLAS_BASEMAP_TOKEN";

/// Everything a single analysis run needs, loadable from a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Path to the incident CSV.
    pub input: PathBuf,
    /// Number of clusters for the incident map.
    pub clusters: usize,
    /// Seed for centroid initialization.
    pub seed: u64,
    /// Random restarts; the best result by within-cluster sum of squares wins.
    pub restarts: usize,
    /// Iteration cap per restart.
    pub max_iterations: u64,
    /// Convergence tolerance on centroid movement.
    pub tolerance: f64,
    /// Directory that receives rendered charts.
    pub output_dir: PathBuf,
    /// Settings handed to the external tile provider.
    pub basemap: BasemapConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("incidents.csv"),
            clusters: 5,
            seed: 42,
            restarts: 20,
            max_iterations: 300,
            tolerance: 1e-4,
            output_dir: PathBuf::from("charts"),
            basemap: BasemapConfig::default(),
        }
    }
}

/// Basemap tile collaborator settings. The credential is supplied via the
/// config file or the environment, never embedded in source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BasemapConfig {
    /// Access credential for the tile provider.
    pub access_token: Option<String>,
    /// West, south, east, north, in degrees.
    pub bounding_box: Option<[f64; 4]>,
    /// Tile zoom level.
    pub zoom: Option<u8>,
}

impl AnalysisConfig {
    /// Load a configuration file and resolve the basemap credential.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut config: Self = toml::from_str(&raw).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.resolve_basemap_token();
        Ok(config)
    }

    /// Fall back to [`BASEMAP_TOKEN_VAR`] when no credential is configured.
    pub fn resolve_basemap_token(&mut self) {
        if self.basemap.access_token.is_none() {
            self.basemap.access_token = std::env::var(BASEMAP_TOKEN_VAR).ok();
        }
    }

    pub fn cluster_params(&self) -> ClusterParams {
        ClusterParams {
            k: self.clusters,
            seed: self.seed,
            restarts: self.restarts,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }
}
