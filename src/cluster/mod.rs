pub mod kmeans;
pub mod model;

pub use kmeans::{synthetic_features, KMeans, KMeansFit};
pub use model::ClusterModel;

/// Assigns an embedding to a cluster.
pub trait Labeler {
    /// Embedding length the labeler expects.
    fn dim(&self) -> usize;

    fn assign(&self, embedding: &[f64]) -> usize;

    fn assign_batch(&self, embeddings: &[Vec<f64>]) -> Vec<usize> {
        embeddings.iter().map(|e| self.assign(e)).collect()
    }
}
