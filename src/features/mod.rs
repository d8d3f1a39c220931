pub mod backbone;
pub mod pool;

pub use backbone::Backbone;
pub use pool::GridPool;

use crate::error::Result;
use crate::images::tensor::ImageTensor;

/// Turns an image into a fixed-length embedding.
pub trait Scorer {
    /// Length of every vector returned by `embed`.
    fn embedding_dim(&self) -> usize;

    fn embed(&self, image: &ImageTensor) -> Result<Vec<f64>>;
}
