//! Chart rendering with Plotters, plus the console cluster summary.
//!
//! Pure presentation sink: everything here consumes the aggregated pipeline
//! outputs and feeds nothing back.

use std::path::Path;

use ndarray::Array2;
use plotters::prelude::*;

use crate::error::Error;
use crate::model::{ClusterModel, LabeledPoint};
use crate::spatial::IncidentPoint;
use crate::temporal::MonthlyCount;
use crate::Result;

/// Color palette for different clusters
const CLUSTER_COLORS: [RGBColor; 6] = [RED, BLUE, GREEN, MAGENTA, CYAN, YELLOW];

fn render<E: std::fmt::Display>(err: E) -> Error {
    Error::Render(err.to_string())
}

/// Bar chart of incident counts per year.
pub fn yearly_histogram(counts: &[(i32, usize)], path: &Path) -> Result<()> {
    let (first_year, last_year) = match (counts.first(), counts.last()) {
        (Some(&(first, _)), Some(&(last, _))) => (first, last),
        _ => {
            log::warn!("no yearly counts to plot");
            return Ok(());
        }
    };
    let max_count = counts.iter().map(|&(_, count)| count).max().unwrap_or(1) as f64;

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(render)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Incidents per Year", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (first_year as f64 - 0.5)..(last_year as f64 + 0.5),
            0f64..(max_count * 1.1),
        )
        .map_err(render)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Incidents")
        .x_label_formatter(&|x| format!("{}", x.round() as i64))
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(render)?;

    for &(year, count) in counts {
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(year as f64 - 0.4, 0.0), (year as f64 + 0.4, count as f64)],
                BLUE.filled(),
            )))
            .map_err(render)?;
    }

    root.present().map_err(render)?;
    log::info!("yearly histogram saved to {}", path.display());
    Ok(())
}

/// Line chart of the chronological month-level series.
pub fn monthly_series_chart(series: &[MonthlyCount], path: &Path) -> Result<()> {
    if series.is_empty() {
        log::warn!("no monthly counts to plot");
        return Ok(());
    }
    let labels: Vec<String> = series
        .iter()
        .map(|m| format!("{:04}-{:02}", m.year, m.month))
        .collect();
    let max_count = series.iter().map(|m| m.count).max().unwrap_or(1) as f64;
    let x_max = (series.len() as f64 - 1.0).max(1.0);

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(render)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Incidents per Month", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..(max_count * 1.1))
        .map_err(render)?;

    chart
        .configure_mesh()
        .x_desc("Month")
        .y_desc("Incidents")
        .x_label_formatter(&|x| {
            labels
                .get(x.round() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(render)?;

    chart
        .draw_series(LineSeries::new(
            series
                .iter()
                .enumerate()
                .map(|(i, m)| (i as f64, m.count as f64)),
            &BLUE,
        ))
        .map_err(render)?;
    chart
        .draw_series(
            series
                .iter()
                .enumerate()
                .map(|(i, m)| Circle::new((i as f64, m.count as f64), 3, BLUE.filled())),
        )
        .map_err(render)?;

    root.present().map_err(render)?;
    log::info!("monthly series saved to {}", path.display());
    Ok(())
}

/// Scatter of incident locations colored by cluster, centroids as squares.
pub fn cluster_map(labeled: &[LabeledPoint], centroids: &Array2<f64>, path: &Path) -> Result<()> {
    if labeled.is_empty() {
        log::warn!("no locatable incidents to plot");
        return Ok(());
    }

    let mut west = f64::INFINITY;
    let mut east = f64::NEG_INFINITY;
    let mut south = f64::INFINITY;
    let mut north = f64::NEG_INFINITY;
    for point in labeled {
        west = west.min(point.location.x());
        east = east.max(point.location.x());
        south = south.min(point.location.y());
        north = north.max(point.location.y());
    }
    let x_pad = ((east - west) * 0.05).max(0.01);
    let y_pad = ((north - south) * 0.05).max(0.01);

    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(render)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Incident Locations by Cluster", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((west - x_pad)..(east + x_pad), (south - y_pad)..(north + y_pad))
        .map_err(render)?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(render)?;

    for point in labeled {
        let color = if point.cluster < CLUSTER_COLORS.len() {
            CLUSTER_COLORS[point.cluster]
        } else {
            BLACK
        };
        chart
            .draw_series(std::iter::once(Circle::new(
                (point.location.x(), point.location.y()),
                3,
                color.filled(),
            )))
            .map_err(render)?;
    }

    // Centroid rows are (latitude, longitude); the chart is (lon, lat).
    for (cluster, centroid) in centroids.outer_iter().enumerate() {
        let (x, y) = (centroid[1], centroid[0]);
        let color = if cluster < CLUSTER_COLORS.len() {
            CLUSTER_COLORS[cluster]
        } else {
            BLACK
        };
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - x_pad / 2.0, y - y_pad / 2.0), (x + x_pad / 2.0, y + y_pad / 2.0)],
                color.filled(),
            )))
            .map_err(render)?
            .label(format!("Cluster {cluster}"))
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart.configure_series_labels().draw().map_err(render)?;
    root.present().map_err(render)?;
    log::info!("cluster map saved to {}", path.display());
    Ok(())
}

/// Print cluster statistics to the console.
pub fn print_cluster_summary(model: &ClusterModel, points: &[IncidentPoint]) {
    println!("\n=== Cluster Statistics ===");
    println!("Number of clusters: {}", model.k);
    println!("Locatable incidents: {}", points.len());
    println!("Within-cluster sum of squares: {:.4}", model.inertia);

    let silhouette = model.silhouette_sample(points, 100.min(points.len()));
    println!("Silhouette score (sample): {silhouette:.3}");

    let sizes = model.cluster_sizes();
    println!("\nCluster sizes:");
    for (cluster, &size) in sizes.iter().enumerate() {
        let percentage = if points.is_empty() {
            0.0
        } else {
            (size as f64 / points.len() as f64) * 100.0
        };
        println!("  Cluster {cluster}: {size} incidents ({percentage:.1}%)");
    }

    println!("\nCluster centroids:");
    println!("  Cluster | Latitude  | Longitude");
    println!("  --------|-----------|----------");
    for (cluster, centroid) in model.centroids.outer_iter().enumerate() {
        println!("  {:7} | {:9.4} | {:9.4}", cluster, centroid[0], centroid[1]);
    }
}

/// Render every chart of the run into `out_dir`.
pub fn render_report(
    yearly: &[(i32, usize)],
    monthly: &[MonthlyCount],
    labeled: &[LabeledPoint],
    model: &ClusterModel,
    out_dir: &Path,
) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| Error::Render(format!("cannot create {}: {e}", out_dir.display())))?;
    yearly_histogram(yearly, &out_dir.join("incidents_by_year.png"))?;
    monthly_series_chart(monthly, &out_dir.join("incidents_by_month.png"))?;
    cluster_map(labeled, &model.centroids, &out_dir.join("cluster_map.png"))?;
    Ok(())
}
