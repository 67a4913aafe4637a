//! Provides the implementation for k-means over sRGB colors

use palette::Srgb;
use std::{
    cmp::Reverse,
    error::Error,
    fmt::{self, Display},
};

/// The default number of colors to find
pub const DEFAULT_K: u8 = 4;

/// The default maximum number of k-means iterations
pub const DEFAULT_MAX_ITER: u32 = 10;

/// Squared Euclidean distance between two colors
fn squared_distance(x: Srgb<u8>, y: Srgb<u8>) -> u32 {
    let dr = u32::from(x.red.abs_diff(y.red));
    let dg = u32::from(x.green.abs_diff(y.green));
    let db = u32::from(x.blue.abs_diff(y.blue));
    dr * dr + dg * dg + db * db
}

/// Error cases for invalid k-means arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterError {
    /// `k` was `0`, but at least one cluster is needed
    ZeroClusters,
}

impl Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClusterError::ZeroClusters => write!(f, "The number of clusters must be at least 1"),
        }
    }
}

impl Error for ClusterError {}

/// A final cluster center
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Centroid {
    /// The average color of the points in this cluster
    pub color: Srgb<u8>,
    /// Number of points in this cluster
    pub count: u32,
}

/// Result from running k-means
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterResult {
    /// Exactly `k` centroids, by descending count
    ///
    /// Centroids with the same count keep the order of their starting centroids.
    pub centroids: Vec<Centroid>,
    /// Number of elapsed iterations
    pub iterations: u32,
}

impl ClusterResult {
    /// Create a result of `k` black centroids with no points
    fn empty(k: u8) -> Self {
        Self {
            centroids: vec![
                Centroid {
                    color: Srgb::new(0, 0, 0),
                    count: 0,
                };
                usize::from(k)
            ],
            iterations: 0,
        }
    }

    /// The centroid colors, most frequent first
    pub fn colors(&self) -> impl ExactSizeIterator<Item = Srgb<u8>> + '_ {
        self.centroids.iter().map(|centroid| centroid.color)
    }
}

/// Data for each center/centroid
struct CenterData {
    /// The centroid point
    centroid: Vec<Srgb<u8>>,
    /// Component sums for all data points in this center
    sum: Vec<[u64; 3]>,
    /// Number of points in this center
    count: Vec<u32>,
}

impl CenterData {
    /// Create a [`CenterData`] for the given starting centroids
    fn new(centroid: Vec<Srgb<u8>>) -> Self {
        let k = centroid.len();
        Self {
            centroid,
            sum: vec![[0; 3]; k],
            count: vec![0; k],
        }
    }
}

/// Choose `k` starting centroids by taking evenly spaced points
///
/// If there are fewer points than `k`, then every point is used and the rest are black.
fn initial_centroids(points: &[Srgb<u8>], k: u8) -> Vec<Srgb<u8>> {
    let k = usize::from(k);
    if points.len() < k {
        let mut centroids = points.to_vec();
        centroids.resize(k, Srgb::new(0, 0, 0));
        centroids
    } else {
        let step = points.len() / k;
        (0..k).map(|i| points[i * step]).collect()
    }
}

/// The index of the closest centroid, preferring the earliest on ties
fn nearest_center(color: Srgb<u8>, centroids: &[Srgb<u8>]) -> usize {
    let mut min_dist = u32::MAX;
    let mut min_center = 0;
    for (i, &centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(color, centroid);
        if dist < min_dist {
            min_dist = dist;
            min_center = i;
        }
    }
    min_center
}

/// Add a color to a component sum
fn add_color(sum: &mut [u64; 3], color: Srgb<u8>) {
    sum[0] += u64::from(color.red);
    sum[1] += u64::from(color.green);
    sum[2] += u64::from(color.blue);
}

/// Assign each point to its closest center and recompute each center's sum and count
#[cfg(not(feature = "threads"))]
fn update_assignments(points: &[Srgb<u8>], centers: &mut CenterData) {
    centers.sum.fill([0; 3]);
    centers.count.fill(0);

    for &color in points {
        let i = nearest_center(color, &centers.centroid);
        add_color(&mut centers.sum[i], color);
        centers.count[i] += 1;
    }
}

/// Assign each point to its closest center and recompute each center's sum and count
#[cfg(feature = "threads")]
fn update_assignments(points: &[Srgb<u8>], centers: &mut CenterData) {
    use rayon::prelude::*;

    let k = centers.centroid.len();
    let centroids = &centers.centroid;

    // Integer sums, so the result does not depend on how the points are split up
    let partials = points
        .par_iter()
        .with_min_len((points.len() / rayon::current_num_threads()).max(1))
        .fold_with(
            (vec![[0u64; 3]; k], vec![0u32; k]),
            |(mut sums, mut counts), &color| {
                let i = nearest_center(color, centroids);
                add_color(&mut sums[i], color);
                counts[i] += 1;
                (sums, counts)
            },
        )
        .collect::<Vec<_>>();

    centers.sum.fill([0; 3]);
    centers.count.fill(0);

    for (partial_sums, partial_counts) in partials {
        for (sum, partial) in centers.sum.iter_mut().zip(&partial_sums) {
            for (s, p) in sum.iter_mut().zip(partial) {
                *s += p;
            }
        }
        for (count, partial) in centers.count.iter_mut().zip(&partial_counts) {
            *count += partial;
        }
    }
}

/// The component-wise mean of `n` colors, rounding halves up
fn rounded_mean(sum: [u64; 3], n: u32) -> Srgb<u8> {
    let n = u64::from(n);
    // each sum is at most 255 * n, so each mean is at most 255
    #[allow(clippy::cast_possible_truncation)]
    let [red, green, blue] = sum.map(|s| ((2 * s + n) / (2 * n)) as u8);
    Srgb::new(red, green, blue)
}

/// Move each non-empty center to the mean of its points, returning whether any centroid changed
///
/// Empty centers keep their previous centroid.
fn update_centroids(centers: &mut CenterData) -> bool {
    let mut changed = false;
    for ((centroid, &n), &sum) in centers.centroid.iter_mut().zip(&centers.count).zip(&centers.sum) {
        if n > 0 {
            let new_centroid = rounded_mean(sum, n);
            changed |= new_centroid != *centroid;
            *centroid = new_centroid;
        }
    }
    changed
}

/// Run k-means on a non-empty slice of points
fn kmeans(points: &[Srgb<u8>], k: u8, max_iter: u32) -> ClusterResult {
    let mut centers = CenterData::new(initial_centroids(points, k));

    let mut iterations = 0;
    let mut changed = true;
    while iterations < max_iter && changed {
        update_assignments(points, &mut centers);
        changed = update_centroids(&mut centers);
        iterations += 1;
    }

    let mut centroids = centers
        .centroid
        .into_iter()
        .zip(centers.count)
        .map(|(color, count)| Centroid { color, count })
        .collect::<Vec<_>>();

    // stable, so ties stay in starting centroid order
    centroids.sort_by_key(|centroid| Reverse(centroid.count));

    ClusterResult { centroids, iterations }
}

/// Cluster the points into exactly `k` colors, sorted by descending number of points.
///
/// The starting centroids are evenly spaced points,
/// so the same points in the same order always give the same result.
/// If `points` is empty, then the result has `k` black centroids with a count of `0`.
///
/// # Errors
/// Returns [`ClusterError::ZeroClusters`] if `k` is `0`.
pub fn run(points: &[Srgb<u8>], k: u8, max_iter: u32) -> Result<ClusterResult, ClusterError> {
    if k == 0 {
        Err(ClusterError::ZeroClusters)
    } else if points.is_empty() {
        Ok(ClusterResult::empty(k))
    } else {
        Ok(kmeans(points, k, max_iter))
    }
}
