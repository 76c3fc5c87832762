//! End-to-end pipeline tests over a synthetic incident extract.

use std::io::Write;

use crimeatlas::{data, model, spatial, temporal, viz, Error};
use crimeatlas::model::ClusterParams;
use tempfile::{tempdir, NamedTempFile};

/// Six rows: one exact duplicate pair, one latitude recorded as the "NA"
/// placeholder, and two well-separated location pairs.
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ID,Date,Primary Type,Arrest,Latitude,Longitude,Year").unwrap();
    writeln!(file, "1001,01/05/2015 01:00:00 AM,THEFT,false,41.8781,-87.6298,2015").unwrap();
    writeln!(file, "1001,01/05/2015 01:00:00 AM,THEFT,false,41.8781,-87.6298,2015").unwrap();
    writeln!(file, "1002,02/10/2015 03:30:00 PM,BATTERY,true,41.8790,-87.6305,2015").unwrap();
    writeln!(file, "1003,02/11/2015 11:15:00 PM,ASSAULT,false,40.7128,-74.0060,2015").unwrap();
    writeln!(file, "1004,03/01/2016 09:45:00 AM,THEFT,false,40.7130,-74.0055,2016").unwrap();
    writeln!(file, "1005,03/02/2016 08:00:00 AM,NARCOTICS,true,NA,-87.6300,2016").unwrap();
    file
}

#[test]
fn test_end_to_end_pipeline() {
    let file = create_test_csv();

    let raw = data::load_dataset(file.path()).unwrap();
    assert_eq!(raw.height(), 6);

    // One duplicate removed; the placeholder-latitude row survives cleaning
    // with a null coordinate.
    let cleaned = data::clean_dataset(&raw).unwrap();
    assert_eq!(cleaned.height(), 5);
    assert_eq!(cleaned.column("Latitude").unwrap().null_count(), 1);

    // Every remaining timestamp parses; bucket totals match the row count.
    let stamps = temporal::parse_timestamps(&cleaned).unwrap();
    assert_eq!(stamps.len(), 5);
    let monthly = temporal::monthly_counts(&stamps);
    let total: usize = monthly.iter().map(|m| m.count).sum();
    assert_eq!(total, 5);
    let yearly = temporal::yearly_counts(&stamps);
    assert_eq!(yearly, vec![(2015, 3), (2016, 2)]);

    // Four of five rows carry usable coordinates.
    let points = spatial::project_points(&cleaned).unwrap();
    assert_eq!(points.len(), 4);

    // Two well-separated pairs split cleanly at k = 2.
    let params = ClusterParams { k: 2, seed: 123, ..ClusterParams::default() };
    let clusters = model::fit_clusters(&points, &params).unwrap();
    assert_eq!(clusters.labels.len(), 4);
    assert!(clusters.labels.iter().all(|&label| label < 2));

    let sizes = clusters.cluster_sizes();
    assert_eq!(sizes.iter().sum::<usize>(), 4);
    assert!(sizes.iter().all(|&size| size > 0));
    assert_eq!(clusters.labels[0], clusters.labels[1]);
    assert_eq!(clusters.labels[2], clusters.labels[3]);
    assert_ne!(clusters.labels[0], clusters.labels[2]);
}

#[test]
fn test_month_buckets_from_source_format() {
    let file = create_test_csv();
    let raw = data::load_dataset(file.path()).unwrap();
    let cleaned = data::clean_dataset(&raw).unwrap();
    let stamps = temporal::parse_timestamps(&cleaned).unwrap();

    let monthly = temporal::monthly_counts(&stamps);
    let buckets: Vec<(i32, u32, usize)> =
        monthly.iter().map(|m| (m.year, m.month, m.count)).collect();
    assert_eq!(
        buckets,
        vec![(2015, 1, 1), (2015, 2, 2), (2016, 3, 2)]
    );
}

#[test]
fn test_clustering_is_reproducible() {
    let file = create_test_csv();
    let raw = data::load_dataset(file.path()).unwrap();
    let cleaned = data::clean_dataset(&raw).unwrap();
    let points = spatial::project_points(&cleaned).unwrap();

    let params = ClusterParams { k: 2, seed: 123, ..ClusterParams::default() };
    let first = model::fit_clusters(&points, &params).unwrap();
    let second = model::fit_clusters(&points, &params).unwrap();
    assert_eq!(first.labels, second.labels);
}

#[test]
fn test_cluster_count_must_fit_data() {
    let file = create_test_csv();
    let raw = data::load_dataset(file.path()).unwrap();
    let cleaned = data::clean_dataset(&raw).unwrap();
    let points = spatial::project_points(&cleaned).unwrap();

    let params = ClusterParams { k: 0, ..ClusterParams::default() };
    assert!(matches!(
        model::fit_clusters(&points, &params),
        Err(Error::InvalidParameter(_))
    ));

    // Only four distinct locations are available.
    let params = ClusterParams { k: 5, ..ClusterParams::default() };
    assert!(matches!(
        model::fit_clusters(&points, &params),
        Err(Error::InvalidParameter(_))
    ));
}

#[test]
fn test_unreadable_input_is_fatal() {
    let result = data::load_dataset(std::path::Path::new("/no/such/extract.csv"));
    assert!(matches!(result, Err(Error::FileFormat { .. })));
}

#[test]
fn test_malformed_timestamp_aborts_aggregation() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ID,Date,Primary Type,Arrest,Latitude,Longitude,Year").unwrap();
    writeln!(file, "1,2015-01-05 01:00:00,THEFT,false,41.88,-87.63,2015").unwrap();

    let raw = data::load_dataset(file.path()).unwrap();
    let cleaned = data::clean_dataset(&raw).unwrap();
    assert!(matches!(
        temporal::parse_timestamps(&cleaned),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn test_charts_render_from_pipeline_outputs() {
    let file = create_test_csv();
    let raw = data::load_dataset(file.path()).unwrap();
    let cleaned = data::clean_dataset(&raw).unwrap();
    let stamps = temporal::parse_timestamps(&cleaned).unwrap();
    let points = spatial::project_points(&cleaned).unwrap();

    let params = ClusterParams { k: 2, seed: 123, ..ClusterParams::default() };
    let clusters = model::fit_clusters(&points, &params).unwrap();
    let labeled = clusters.label_points(&points);

    let out_dir = tempdir().unwrap();
    viz::render_report(
        &temporal::yearly_counts(&stamps),
        &temporal::monthly_counts(&stamps),
        &labeled,
        &clusters,
        out_dir.path(),
    )
    .unwrap();

    assert!(out_dir.path().join("incidents_by_year.png").exists());
    assert!(out_dir.path().join("incidents_by_month.png").exists());
    assert!(out_dir.path().join("cluster_map.png").exists());
}
