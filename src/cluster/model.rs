use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::Labeler;
use crate::error::{Error, Result};

/// Fitted k-means state as stored on disk:
/// `{"n_clusters": 2, "random_state": 42, "centroids": [[...], [...]]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterModel {
    pub n_clusters: usize,
    /// Seed of the fit that produced the centroids; unused at prediction time.
    pub random_state: u64,
    pub centroids: Vec<Vec<f64>>,
}

impl ClusterModel {
    pub fn new(random_state: u64, centroids: Vec<Vec<f64>>) -> Result<ClusterModel> {
        let model = ClusterModel { n_clusters: centroids.len(), random_state, centroids };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(Error::InvalidModel("n_clusters must be positive".into()));
        }
        if self.centroids.len() != self.n_clusters {
            return Err(Error::InvalidModel(format!(
                "n_clusters is {} but {} centroid(s) are stored",
                self.n_clusters,
                self.centroids.len()
            )));
        }
        let dim = self.centroids[0].len();
        if dim == 0 {
            return Err(Error::InvalidModel("centroids are empty".into()));
        }
        if let Some(i) = self.centroids.iter().position(|c| c.len() != dim) {
            return Err(Error::InvalidModel(format!(
                "centroid {} has {} values, centroid 0 has {}",
                i,
                self.centroids[i].len(),
                dim
            )));
        }
        if self.centroids.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::InvalidModel("centroids contain non-finite values".into()));
        }
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.centroids.first().map_or(0, |c| c.len())
    }

    /// Index of the nearest centroid by squared Euclidean distance; the lower
    /// index wins ties.
    pub fn predict(&self, x: &[f64]) -> usize {
        nearest(&self.centroids, x).0
    }

    pub fn predict_batch(&self, xs: &[Vec<f64>]) -> Vec<usize> {
        xs.iter().map(|x| self.predict(x)).collect()
    }

    /// Serializes the model to a JSON file, creating the parent directory.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self).map_err(|e| Error::json(path, e))
    }

    /// Reads and validates a model written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<ClusterModel> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = std::io::BufReader::new(file);
        let model: ClusterModel = serde_json::from_reader(reader).map_err(|e| Error::json(path, e))?;
        model.validate()?;
        Ok(model)
    }
}

impl Labeler for ClusterModel {
    fn dim(&self) -> usize {
        ClusterModel::dim(self)
    }

    fn assign(&self, embedding: &[f64]) -> usize {
        self.predict(embedding)
    }
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// (index, squared distance) of the centroid closest to `x`.
pub(crate) fn nearest(centroids: &[Vec<f64>], x: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(c, x);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}
