use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::cluster::model::{nearest, squared_distance, ClusterModel};
use crate::error::{Error, Result};

/// K-means with k-means++ seeding and Lloyd iterations. The best of
/// `n_init` seeded restarts (lowest inertia) is kept.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    pub random_state: u64,
    pub max_iter: usize,
    /// Convergence tolerance on total squared centroid shift, relative to the
    /// mean per-feature variance of the data.
    pub tol: f64,
    pub n_init: usize,
}

/// Result of a fit.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub model: ClusterModel,
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub n_iter: usize,
}

impl KMeans {
    pub fn new(n_clusters: usize, random_state: u64) -> KMeans {
        KMeans { n_clusters, random_state, max_iter: 300, tol: 1e-4, n_init: 10 }
    }

    pub fn fit(&self, data: &[Vec<f64>]) -> Result<KMeansFit> {
        self.check(data)?;

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let tol = self.tol * mean_variance(data);
        let mut best: Option<Run> = None;

        for init in 0..self.n_init.max(1) {
            let run = self.lloyd(data, self.plus_plus(data, &mut rng), tol);
            debug!("k-means init {}: inertia {:.6} after {} iteration(s)", init, run.inertia, run.n_iter);
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }

        let best = best.ok_or_else(|| Error::Training("no initialization ran".into()))?;
        info!(
            "fitted {} clusters on {} samples (inertia {:.6})",
            self.n_clusters,
            data.len(),
            best.inertia
        );
        Ok(KMeansFit {
            model: ClusterModel::new(self.random_state, best.centroids)?,
            labels: best.labels,
            inertia: best.inertia,
            n_iter: best.n_iter,
        })
    }

    fn check(&self, data: &[Vec<f64>]) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(Error::Training("n_clusters must be positive".into()));
        }
        if data.len() < self.n_clusters {
            return Err(Error::Training(format!(
                "n_samples={} should be >= n_clusters={}",
                data.len(),
                self.n_clusters
            )));
        }
        let dim = data[0].len();
        if dim == 0 {
            return Err(Error::Training("samples have no features".into()));
        }
        if let Some(i) = data.iter().position(|row| row.len() != dim) {
            return Err(Error::Training(format!(
                "sample {} has {} features, sample 0 has {}",
                i,
                data[i].len(),
                dim
            )));
        }
        if data.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::Training("samples contain non-finite values".into()));
        }
        Ok(())
    }

    /// k-means++: first center uniform, each next one drawn with probability
    /// proportional to its squared distance from the closest chosen center.
    fn plus_plus(&self, data: &[Vec<f64>], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let mut centers = vec![data[rng.gen_range(0..data.len())].clone()];
        let mut dist: Vec<f64> = data.iter().map(|x| squared_distance(x, &centers[0])).collect();

        while centers.len() < self.n_clusters {
            let total: f64 = dist.iter().sum();
            let pick = if total > 0.0 {
                let mut target = rng.gen::<f64>() * total;
                let mut chosen = data.len() - 1;
                for (i, d) in dist.iter().enumerate() {
                    if target < *d {
                        chosen = i;
                        break;
                    }
                    target -= d;
                }
                chosen
            } else {
                // Every point already coincides with a center.
                rng.gen_range(0..data.len())
            };

            centers.push(data[pick].clone());
            let newest = &centers[centers.len() - 1];
            for (d, x) in dist.iter_mut().zip(data.iter()) {
                *d = d.min(squared_distance(x, newest));
            }
        }
        centers
    }

    fn lloyd(&self, data: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, tol: f64) -> Run {
        let dim = data[0].len();
        let mut labels = vec![0; data.len()];
        let mut n_iter = 0;

        for iter in 1..=self.max_iter.max(1) {
            n_iter = iter;
            for (label, x) in labels.iter_mut().zip(data.iter()) {
                *label = nearest(&centroids, x).0;
            }

            let mut sums = vec![vec![0.0; dim]; self.n_clusters];
            let mut counts = vec![0usize; self.n_clusters];
            for (&label, x) in labels.iter().zip(data.iter()) {
                counts[label] += 1;
                for (s, v) in sums[label].iter_mut().zip(x.iter()) {
                    *s += v;
                }
            }

            let mut updated: Vec<Vec<f64>> = sums.into_iter()
                .zip(counts.iter())
                .zip(centroids.iter())
                .map(|((sum, &count), old)| {
                    if count == 0 {
                        old.clone()
                    } else {
                        sum.into_iter().map(|s| s / count as f64).collect()
                    }
                })
                .collect();
            relocate_empty(data, &labels, &counts, &mut updated);

            let shift: f64 = centroids.iter()
                .zip(updated.iter())
                .map(|(a, b)| squared_distance(a, b))
                .sum();
            centroids = updated;
            if shift <= tol {
                break;
            }
        }

        for (label, x) in labels.iter_mut().zip(data.iter()) {
            *label = nearest(&centroids, x).0;
        }
        let inertia = labels.iter()
            .zip(data.iter())
            .map(|(&l, x)| squared_distance(x, &centroids[l]))
            .sum();
        Run { centroids, labels, inertia, n_iter }
    }
}

struct Run {
    centroids: Vec<Vec<f64>>,
    labels: Vec<usize>,
    inertia: f64,
    n_iter: usize,
}

/// Moves each empty cluster onto the point farthest from its current
/// centroid, one distinct point per empty cluster.
fn relocate_empty(data: &[Vec<f64>], labels: &[usize], counts: &[usize], centroids: &mut [Vec<f64>]) {
    let empty: Vec<usize> = (0..counts.len()).filter(|&k| counts[k] == 0).collect();
    if empty.is_empty() {
        return;
    }
    let mut order: Vec<(usize, f64)> = data.iter()
        .zip(labels.iter())
        .enumerate()
        .map(|(i, (x, &l))| (i, squared_distance(x, &centroids[l])))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (k, (i, _)) in empty.into_iter().zip(order) {
        centroids[k] = data[i].clone();
    }
}

fn mean_variance(data: &[Vec<f64>]) -> f64 {
    let n = data.len() as f64;
    let dim = data[0].len();
    let mut total = 0.0;
    for j in 0..dim {
        let mean = data.iter().map(|row| row[j]).sum::<f64>() / n;
        total += data.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n;
    }
    total / dim as f64
}

/// Uniform [0, 1) placeholder features, for fitting a model before real
/// embeddings exist.
pub fn synthetic_features(n_samples: usize, n_features: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_samples)
        .map(|_| (0..n_features).map(|_| rng.gen::<f64>()).collect())
        .collect()
}
