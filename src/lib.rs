//! crimeatlas: descriptive analysis of a municipal crime-incident dataset.
//!
//! The pipeline loads a flat CSV of incident reports, cleans it, derives
//! monthly and yearly incident counts, projects valid coordinates to WGS84
//! points, and partitions incident locations with seeded k-means. Charts are
//! rendered from the aggregated outputs; nothing is written back to the
//! source data.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod spatial;
pub mod temporal;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use config::{AnalysisConfig, BasemapConfig};
pub use error::Error;
pub use model::{fit_clusters, select_k, ClusterModel, ClusterParams, LabeledPoint};
pub use spatial::{bounding_box, project_points, IncidentPoint};
pub use temporal::{
    month_crosstab, monthly_counts, parse_timestamps, yearly_counts, MonthlyCount, YearRow,
};

/// Common result type used throughout the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
