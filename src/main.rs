//! crimeatlas: batch analysis of a municipal crime-incident extract.
//!
//! This is the entrypoint that orchestrates loading, cleaning, temporal
//! aggregation, spatial projection, clustering, and chart rendering.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use crimeatlas::cli::Args;
use crimeatlas::config::AnalysisConfig;
use crimeatlas::{data, model, spatial, temporal, viz};

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();
    let config = args.resolve_config()?;

    if args.verbose {
        println!("crimeatlas - municipal crime incident analysis");
        println!("==============================================\n");
    }

    run_pipeline(&args, &config)?;
    Ok(())
}

/// Run the full analysis once, aborting on the first fatal error.
fn run_pipeline(args: &Args, config: &AnalysisConfig) -> Result<()> {
    let start_time = Instant::now();

    // Stage 1: load and clean
    if args.verbose {
        println!("Stage 1: loading {}", config.input.display());
    }
    let raw = data::load_dataset(&config.input)?;
    let cleaned = data::clean_dataset(&raw)?;
    println!(
        "✓ Dataset cleaned: {} rows kept of {} read",
        cleaned.height(),
        raw.height()
    );

    // Stage 2: temporal aggregation
    let stamps = temporal::parse_timestamps(&cleaned)?;
    let monthly = temporal::monthly_counts(&stamps);
    let yearly = temporal::yearly_counts(&stamps);
    println!(
        "✓ Temporal aggregation: {} month buckets across {} years",
        monthly.len(),
        yearly.len()
    );
    if args.verbose {
        println!("\n  Year  Jan..Dec");
        for row in temporal::month_crosstab(&stamps) {
            println!("  {}  {:?}", row.year, row.by_month);
        }
        println!();
    }

    // Stage 3: spatial projection
    let points = spatial::project_points(&cleaned)?;
    println!("✓ Spatial projection: {} locatable incidents", points.len());
    if args.verbose {
        if let Some(bbox) = spatial::bounding_box(&points) {
            println!(
                "  extent: ({:.4}, {:.4}) to ({:.4}, {:.4})",
                bbox.min().x,
                bbox.min().y,
                bbox.max().x,
                bbox.max().y
            );
        }
        if config.basemap.access_token.is_some() {
            println!("  basemap credential: configured");
        }
    }

    // Stage 4: clustering
    let mut params = config.cluster_params();
    if args.select_k {
        let scan = model::select_k(&points, &params, args.k_max)?;
        println!("\nSilhouette scan:");
        for (k, score) in &scan.scores {
            println!("  k={k}: {score:.3}");
        }
        println!("Best k: {}", scan.best);
        params.k = scan.best;
    }

    let fit_start = Instant::now();
    let clusters = model::fit_clusters(&points, &params)?;
    let labeled = clusters.label_points(&points);
    println!(
        "✓ Clustering: {} clusters in {:.2}s",
        clusters.k,
        fit_start.elapsed().as_secs_f64()
    );
    viz::print_cluster_summary(&clusters, &points);

    // Stage 5: charts
    viz::render_report(&yearly, &monthly, &labeled, &clusters, &config.output_dir)?;
    println!("\n✓ Charts written to {}", config.output_dir.display());
    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
