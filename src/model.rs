//! K-means partitioning of incident locations.

use std::collections::HashSet;

use geo::Point;
use linfa::prelude::*;
use linfa_clustering::{KMeans, KMeansInit};
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::error::Error;
use crate::spatial::IncidentPoint;
use crate::Result;

/// Tunables for one clustering run. The same seed, k, and input ordering
/// reproduce the same label array.
#[derive(Debug, Clone)]
pub struct ClusterParams {
    /// Number of clusters.
    pub k: usize,
    /// Seed for centroid initialization.
    pub seed: u64,
    /// Random restarts; the best result by within-cluster sum of squares wins.
    pub restarts: usize,
    /// Iteration cap per restart.
    pub max_iterations: u64,
    /// Convergence tolerance on centroid movement.
    pub tolerance: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            k: 5,
            seed: 42,
            restarts: 20,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

/// A fitted partition of the incident locations.
#[derive(Debug, Clone)]
pub struct ClusterModel {
    /// Number of clusters.
    pub k: usize,
    /// Cluster label per input point, in input order.
    pub labels: Array1<usize>,
    /// Centroid rows as (latitude, longitude).
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
}

/// An incident point paired with its cluster label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledPoint {
    pub row: usize,
    pub location: Point<f64>,
    pub cluster: usize,
}

/// Outcome of a silhouette scan over candidate cluster counts.
#[derive(Debug, Clone)]
pub struct KScan {
    /// (k, sampled silhouette score) per candidate, ascending k.
    pub scores: Vec<(usize, f64)>,
    /// Candidate with the highest score.
    pub best: usize,
}

/// Partition `points` into `params.k` clusters.
///
/// Lloyd's iteration over the (latitude, longitude) plane: random centroid
/// initialization, `restarts` seeded restarts keeping the best result by
/// within-cluster sum of squares, assignment/update rounds until labels stop
/// changing or the iteration cap is reached. Parameter validation happens
/// before any clustering work.
pub fn fit_clusters(points: &[IncidentPoint], params: &ClusterParams) -> Result<ClusterModel> {
    if params.k == 0 {
        return Err(Error::InvalidParameter(String::from(
            "cluster count must be at least 1",
        )));
    }
    let distinct = distinct_locations(points);
    if params.k > distinct {
        return Err(Error::InvalidParameter(format!(
            "cluster count {} exceeds the {} distinct locations available",
            params.k, distinct
        )));
    }

    let features = coordinate_matrix(points);
    let dataset = Dataset::new(features, Array1::<usize>::zeros(points.len()));

    let rng = Xoshiro256Plus::seed_from_u64(params.seed);
    let model = KMeans::params_with(params.k, rng, L2Dist)
        .init_method(KMeansInit::Random)
        .n_runs(params.restarts)
        .max_n_iterations(params.max_iterations)
        .tolerance(params.tolerance)
        .fit(&dataset)
        .map_err(|e| Error::InvalidParameter(format!("k-means fit failed: {e}")))?;

    let labels = model.predict(&dataset);
    let centroids = model.centroids().clone();
    let inertia = within_cluster_sum_of_squares(dataset.records(), &labels, &centroids);
    log::info!("k-means: k={} inertia={:.3}", params.k, inertia);

    Ok(ClusterModel {
        k: params.k,
        labels,
        centroids,
        inertia,
    })
}

impl ClusterModel {
    /// Pair each input point with its label. `points` must be the slice the
    /// model was fitted on; the input itself is left untouched.
    pub fn label_points(&self, points: &[IncidentPoint]) -> Vec<LabeledPoint> {
        points
            .iter()
            .zip(self.labels.iter())
            .map(|(point, &cluster)| LabeledPoint {
                row: point.row,
                location: point.location,
                cluster,
            })
            .collect()
    }

    /// Nearest-centroid assignment for a new location. Ties go to the lowest
    /// centroid index.
    pub fn predict(&self, location: &Point<f64>) -> usize {
        let mut closest = 0;
        let mut closest_distance = f64::INFINITY;
        for (cluster, centroid) in self.centroids.outer_iter().enumerate() {
            let distance = (location.y() - centroid[0]).powi(2)
                + (location.x() - centroid[1]).powi(2);
            if distance < closest_distance {
                closest_distance = distance;
                closest = cluster;
            }
        }
        closest
    }

    /// Number of points assigned to each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &label in self.labels.iter() {
            if label < self.k {
                sizes[label] += 1;
            }
        }
        sizes
    }

    /// Mean silhouette coefficient over the first `sample_size` points.
    pub fn silhouette_sample(&self, points: &[IncidentPoint], sample_size: usize) -> f64 {
        let features = coordinate_matrix(points);
        let n = features.nrows().min(sample_size).min(self.labels.len());
        if n < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;
        for i in 0..n {
            let own_label = self.labels[i];
            let mut same_cluster = Vec::new();
            let mut other_clusters: Vec<Vec<f64>> = vec![Vec::new(); self.k];

            for j in 0..n {
                if i == j {
                    continue;
                }
                let distance = euclidean_distance(&features.row(i), &features.row(j));
                let label = self.labels[j];
                if label == own_label {
                    same_cluster.push(distance);
                } else if label < self.k {
                    other_clusters[label].push(distance);
                }
            }

            let a_i = if same_cluster.is_empty() {
                0.0
            } else {
                same_cluster.iter().sum::<f64>() / same_cluster.len() as f64
            };
            let b_i = other_clusters
                .iter()
                .filter(|distances| !distances.is_empty())
                .map(|distances| distances.iter().sum::<f64>() / distances.len() as f64)
                .fold(f64::INFINITY, f64::min);

            silhouette_sum += if b_i.is_infinite() || (a_i == 0.0 && b_i == 0.0) {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };
        }
        silhouette_sum / n as f64
    }
}

/// Scan cluster counts `2..=k_max` and score each with a sampled silhouette.
pub fn select_k(points: &[IncidentPoint], params: &ClusterParams, k_max: usize) -> Result<KScan> {
    let upper = k_max.min(distinct_locations(points));
    if upper < 2 {
        return Err(Error::InvalidParameter(String::from(
            "need at least 2 distinct locations to scan cluster counts",
        )));
    }

    let mut scores = Vec::new();
    let mut best = (2, f64::NEG_INFINITY);
    for k in 2..=upper {
        let trial = ClusterParams { k, ..params.clone() };
        let model = fit_clusters(points, &trial)?;
        let score = model.silhouette_sample(points, 200.min(points.len()));
        if score > best.1 {
            best = (k, score);
        }
        scores.push((k, score));
    }
    Ok(KScan { scores, best: best.0 })
}

/// Feature matrix with one (latitude, longitude) row per point.
pub fn coordinate_matrix(points: &[IncidentPoint]) -> Array2<f64> {
    Array2::from_shape_fn((points.len(), 2), |(i, j)| {
        if j == 0 {
            points[i].location.y()
        } else {
            points[i].location.x()
        }
    })
}

fn distinct_locations(points: &[IncidentPoint]) -> usize {
    points
        .iter()
        .map(|p| (p.location.y().to_bits(), p.location.x().to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

fn within_cluster_sum_of_squares(
    features: &Array2<f64>,
    labels: &Array1<usize>,
    centroids: &Array2<f64>,
) -> f64 {
    let mut total = 0.0;
    for (i, &cluster) in labels.iter().enumerate() {
        if cluster < centroids.nrows() {
            let point = features.row(i);
            let centroid = centroids.row(cluster);
            total += point
                .iter()
                .zip(centroid.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
        }
    }
    total
}

fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(row: usize, latitude: f64, longitude: f64) -> IncidentPoint {
        IncidentPoint {
            row,
            location: Point::new(longitude, latitude),
        }
    }

    /// Two tight pairs, more than a degree apart.
    fn two_pairs() -> Vec<IncidentPoint> {
        vec![
            point(0, 41.8781, -87.6298),
            point(1, 41.8790, -87.6305),
            point(2, 40.7128, -74.0060),
            point(3, 40.7130, -74.0055),
        ]
    }

    #[test]
    fn test_fit_splits_separated_pairs() {
        let points = two_pairs();
        let params = ClusterParams { k: 2, seed: 123, ..ClusterParams::default() };
        let model = fit_clusters(&points, &params).unwrap();

        assert_eq!(model.labels.len(), 4);
        assert!(model.labels.iter().all(|&label| label < 2));
        let sizes = model.cluster_sizes();
        assert_eq!(sizes.iter().sum::<usize>(), 4);
        assert!(sizes.iter().all(|&size| size > 0));
        assert_eq!(model.labels[0], model.labels[1]);
        assert_eq!(model.labels[2], model.labels[3]);
        assert_ne!(model.labels[0], model.labels[2]);
    }

    #[test]
    fn test_same_seed_reproduces_labels() {
        let points = two_pairs();
        let params = ClusterParams { k: 2, seed: 9, ..ClusterParams::default() };
        let first = fit_clusters(&points, &params).unwrap();
        let second = fit_clusters(&points, &params).unwrap();
        assert_eq!(first.labels, second.labels);
        assert_eq!(first.inertia, second.inertia);
    }

    #[test]
    fn test_zero_k_rejected() {
        let params = ClusterParams { k: 0, ..ClusterParams::default() };
        let result = fit_clusters(&two_pairs(), &params);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_k_beyond_distinct_points_rejected() {
        // Four points but only two distinct locations.
        let points = vec![
            point(0, 41.88, -87.63),
            point(1, 41.88, -87.63),
            point(2, 40.71, -74.01),
            point(3, 40.71, -74.01),
        ];
        let params = ClusterParams { k: 3, ..ClusterParams::default() };
        let result = fit_clusters(&points, &params);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_labeling_does_not_mutate_input() {
        let points = two_pairs();
        let params = ClusterParams { k: 2, seed: 1, ..ClusterParams::default() };
        let model = fit_clusters(&points, &params).unwrap();
        let labeled = model.label_points(&points);

        assert_eq!(labeled.len(), points.len());
        for (original, labeled) in points.iter().zip(&labeled) {
            assert_eq!(original.row, labeled.row);
            assert_eq!(original.location, labeled.location);
            assert!(labeled.cluster < 2);
        }
    }

    #[test]
    fn test_predict_breaks_ties_low() {
        let model = ClusterModel {
            k: 2,
            labels: Array1::<usize>::from_vec(vec![]),
            centroids: Array2::from_shape_fn((2, 2), |(i, _)| if i == 0 { 0.0 } else { 2.0 }),
            inertia: 0.0,
        };
        // Equidistant from centroids (0,0) and (2,2).
        assert_eq!(model.predict(&Point::new(1.0, 1.0)), 0);
    }

    #[test]
    fn test_select_k_finds_three_groups() {
        let mut points = Vec::new();
        for (i, &(lat, lon)) in [(41.88, -87.63), (40.71, -74.01), (34.05, -118.24)]
            .iter()
            .enumerate()
        {
            for j in 0..3 {
                points.push(point(i * 3 + j, lat + j as f64 * 0.001, lon + j as f64 * 0.001));
            }
        }
        let scan = select_k(&points, &ClusterParams::default(), 5).unwrap();
        assert_eq!(scan.scores.len(), 4);
        assert_eq!(scan.best, 3);
    }
}
