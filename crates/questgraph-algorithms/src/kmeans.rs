//! K-means clustering with k-means++ seeding
//!
//! 1. Seed k centroids with k-means++ (distance-weighted sampling)
//! 2. Assign each vector to its nearest centroid (Euclidean distance)
//! 3. Recompute centroids as the mean of their members
//! 4. Repeat until assignments stop changing or `max_iterations` is hit
//!
//! The random source is passed in so callers can pin seeding with a
//! seeded generator (`StdRng::seed_from_u64`).

use super::common::{mean, squared_euclidean};
use rand::Rng;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Result of a k-means run
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Non-empty clusters, each a list of input indices in ascending order
    pub clusters: Vec<Vec<usize>>,
    /// Cluster index for every input vector; indexes into `clusters`
    pub assignments: Vec<usize>,
    /// One centroid per entry of `clusters`
    pub centroids: Vec<Vec<f32>>,
    /// Lloyd iterations executed
    pub iterations: usize,
    /// Whether a fixed point was reached before the iteration cap
    pub converged: bool,
}

impl KMeansResult {
    fn empty() -> Self {
        Self {
            clusters: Vec::new(),
            assignments: Vec::new(),
            centroids: Vec::new(),
            iterations: 0,
            converged: true,
        }
    }

    /// Number of (non-empty) clusters.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }
}

/// Partition `vectors` into at most `k` clusters.
///
/// `k` is clamped to `[1, vectors.len()]`. Empty input yields an empty result.
/// Empty clusters are dropped from the output and the remaining clusters are
/// renumbered, so `assignments[i]` always indexes `clusters` and `centroids`.
pub fn kmeans<V, R>(vectors: &[V], k: usize, max_iterations: usize, rng: &mut R) -> KMeansResult
where
    V: AsRef<[f32]>,
    R: Rng + ?Sized,
{
    let n = vectors.len();
    if n == 0 {
        return KMeansResult::empty();
    }
    let k = k.clamp(1, n);
    let dim = vectors[0].as_ref().len();

    let mut centroids = kmeans_plus_plus_init(vectors, k, rng);
    let mut assignments = vec![usize::MAX; n];
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..max_iterations.max(1) {
        iterations += 1;

        let next: Vec<usize> = vectors
            .iter()
            .map(|v| nearest_centroid(v.as_ref(), &centroids))
            .collect();

        if next == assignments {
            converged = true;
            break;
        }
        assignments = next;

        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members = vectors
                .iter()
                .zip(assignments.iter())
                .filter(|(_, &a)| a == c)
                .map(|(v, _)| v.as_ref());
            // Empty clusters keep their previous centroid
            if let Some(m) = mean(members, dim) {
                *centroid = m;
            }
        }
    }

    compact(assignments, centroids, iterations, converged)
}

/// k-means++ seeding: the first centroid is uniform, each following one is
/// drawn with probability proportional to its squared distance from the
/// nearest centroid chosen so far. Once every point coincides with a
/// centroid, the first point is taken.
pub fn kmeans_plus_plus_init<V, R>(vectors: &[V], k: usize, rng: &mut R) -> Vec<Vec<f32>>
where
    V: AsRef<[f32]>,
    R: Rng + ?Sized,
{
    let n = vectors.len();
    if n == 0 || k == 0 {
        return Vec::new();
    }

    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    centroids.push(vectors[rng.gen_range(0..n)].as_ref().to_vec());

    let mut nearest: Vec<f32> = vectors
        .iter()
        .map(|v| squared_euclidean(v.as_ref(), &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f32 = nearest.iter().sum();

        let chosen = if total > 0.0 && total.is_finite() {
            let target = rng.gen::<f32>() * total;
            let mut cumulative = 0.0f32;
            let mut pick = n - 1;
            for (i, d) in nearest.iter().enumerate() {
                cumulative += d;
                if cumulative >= target && *d > 0.0 {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // Every point coincides with a centroid
            0
        };

        let centroid = vectors[chosen].as_ref().to_vec();
        for (d, v) in nearest.iter_mut().zip(vectors.iter()) {
            let dist = squared_euclidean(v.as_ref(), &centroid);
            if dist < *d {
                *d = dist;
            }
        }
        centroids.push(centroid);
    }

    centroids
}

/// Index of the closest centroid; ties go to the lowest index.
fn nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_euclidean(vector, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Drop empty clusters and renumber assignments to match.
fn compact(
    assignments: Vec<usize>,
    centroids: Vec<Vec<f32>>,
    iterations: usize,
    converged: bool,
) -> KMeansResult {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); centroids.len()];
    for (i, &a) in assignments.iter().enumerate() {
        members[a].push(i);
    }

    let mut remap = vec![usize::MAX; centroids.len()];
    let mut clusters = Vec::new();
    let mut kept = Vec::new();
    for (old, (group, centroid)) in members.into_iter().zip(centroids).enumerate() {
        if group.is_empty() {
            continue;
        }
        remap[old] = clusters.len();
        clusters.push(group);
        kept.push(centroid);
    }

    KMeansResult {
        clusters,
        assignments: assignments.into_iter().map(|a| remap[a]).collect(),
        centroids: kept,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
        ]
    }

    #[test]
    fn test_empty_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = kmeans::<Vec<f32>, _>(&[], 3, 10, &mut rng);
        assert!(result.clusters.is_empty());
        assert!(result.centroids.is_empty());
        assert!(result.assignments.is_empty());
    }

    #[test]
    fn test_separates_blobs() {
        let mut rng = StdRng::seed_from_u64(42);
        let result = kmeans(&two_blobs(), 2, 10, &mut rng);

        assert_eq!(result.num_clusters(), 2);
        assert!(result.converged);
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[0], result.assignments[2]);
        assert_eq!(result.assignments[3], result.assignments[4]);
        assert_eq!(result.assignments[3], result.assignments[5]);
        assert_ne!(result.assignments[0], result.assignments[3]);
    }

    #[test]
    fn test_k_clamped_to_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let vectors = vec![vec![0.0, 1.0], vec![5.0, 5.0]];
        let result = kmeans(&vectors, 10, 10, &mut rng);

        assert_eq!(result.num_clusters(), 2);
        assert_eq!(result.centroids.len(), 2);
        assert_ne!(result.assignments[0], result.assignments[1]);
    }

    #[test]
    fn test_duplicates_collapse_and_renumber() {
        let mut rng = StdRng::seed_from_u64(3);
        let vectors = vec![vec![1.0, 1.0]; 4];
        let result = kmeans(&vectors, 3, 10, &mut rng);

        // All points coincide, so every point lands in the first centroid
        assert_eq!(result.num_clusters(), 1);
        assert!(result.assignments.iter().all(|&a| a == 0));
        assert_eq!(result.clusters[0], vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_same_seed_same_result() {
        let a = kmeans(&two_blobs(), 3, 10, &mut StdRng::seed_from_u64(99));
        let b = kmeans(&two_blobs(), 3, 10, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_plus_plus_spreads_seeds() {
        let mut rng = StdRng::seed_from_u64(5);
        let seeds = kmeans_plus_plus_init(&two_blobs(), 2, &mut rng);
        assert_eq!(seeds.len(), 2);
        // With two far blobs the second seed must come from the other blob
        assert!(squared_euclidean(&seeds[0], &seeds[1]) > 50.0);
    }

    #[test]
    fn test_plus_plus_takes_first_point_when_exhausted() {
        // Two distinct points: the third seed finds every distance at zero
        let points = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let seeds = kmeans_plus_plus_init(&points, 3, &mut rng);
            assert_eq!(seeds.len(), 3);
            assert_ne!(seeds[0], seeds[1]);
            assert_eq!(seeds[2], points[0]);
        }
    }

    proptest! {
        #[test]
        fn prop_assignments_cover_input(
            points in prop::collection::vec(prop::collection::vec(-5.0f32..5.0, 4), 1..40),
            k in 1usize..8,
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = kmeans(&points, k, DEFAULT_MAX_ITERATIONS, &mut rng);

            prop_assert_eq!(result.assignments.len(), points.len());
            prop_assert!(result.num_clusters() <= k.min(points.len()));
            for (i, &a) in result.assignments.iter().enumerate() {
                prop_assert!(a < result.num_clusters());
                prop_assert!(result.clusters[a].contains(&i));
            }
            let total: usize = result.clusters.iter().map(|c| c.len()).sum();
            prop_assert_eq!(total, points.len());
        }

        #[test]
        fn prop_fixed_point_is_stable(
            points in prop::collection::vec(prop::collection::vec(-5.0f32..5.0, 3), 2..30),
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = kmeans(&points, 3, 100, &mut rng);
            prop_assume!(result.converged);

            // Re-assigning against converged centroids changes nothing
            let reassigned: Vec<usize> = points
                .iter()
                .map(|p| nearest_centroid(p, &result.centroids))
                .collect();
            prop_assert_eq!(reassigned, result.assignments);
        }
    }
}
