use std::path::Path;

use log::info;
use rand::{rngs::StdRng, SeedableRng};

use crate::activation::activation::ActivationFunction;
use crate::attack::Classifier;
use crate::error::{Error, Result};
use crate::features::pool::GridPool;
use crate::features::Scorer;
use crate::images::tensor::ImageTensor;
use crate::images::IMAGE_SIZE;
use crate::network::{InputType, ModelMetadata, Network};

/// Seed of the built-in backbone used when no weights file is given.
pub const DEFAULT_BACKBONE_SEED: u64 = 42;
/// Pooling grid side of the built-in backbone.
pub const DEFAULT_GRID: u32 = 8;
/// Hidden layer widths of the built-in backbone; the last one is the
/// embedding width.
pub const DEFAULT_HIDDEN: [usize; 2] = [128, 64];
/// Classes in the built-in backbone's head.
pub const DEFAULT_CLASSES: usize = 10;

/// Image feature extractor: grid average-pooling followed by a dense
/// classifier. The classifier without its head produces embeddings; with
/// its head it is the target of the adversarial attack.
#[derive(Debug, Clone)]
pub struct Backbone {
    pool: GridPool,
    network: Network,
}

impl Backbone {
    /// Wraps a network whose metadata declares an `ImageRgb` input grid.
    pub fn from_network(network: Network) -> Result<Backbone> {
        network.validate().map_err(Error::InvalidBackbone)?;

        let input_type = network.metadata.as_ref().and_then(|m| m.input_type.clone());
        let pool = match input_type {
            Some(InputType::ImageRgb { width, height }) => {
                if width == 0 || height == 0 || width > IMAGE_SIZE || height > IMAGE_SIZE {
                    return Err(Error::InvalidBackbone(format!(
                        "{}x{} input grid must lie within 1..={} on each side",
                        width, height, IMAGE_SIZE
                    )));
                }
                GridPool::new(width, height)
            }
            Some(InputType::Numeric) | None => {
                return Err(Error::InvalidBackbone(
                    "metadata.input_type must be ImageRgb".into(),
                ))
            }
        };
        if pool.output_len() != network.input_size() {
            return Err(Error::InvalidBackbone(format!(
                "{}x{} RGB grid gives {} inputs but the first layer takes {}",
                pool.grid_w,
                pool.grid_h,
                pool.output_len(),
                network.input_size()
            )));
        }
        Ok(Backbone { pool, network })
    }

    /// Builds a deterministic backbone from `seed`.
    pub fn seeded(grid: u32, hidden: &[usize], classes: usize, seed: u64) -> Backbone {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut specs = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = GridPool::new(grid, grid).output_len();
        for &width in hidden {
            specs.push((width, fan_in, ActivationFunction::ReLU));
            fan_in = width;
        }
        specs.push((classes, fan_in, ActivationFunction::Softmax));

        let mut network = Network::new(specs, &mut rng);
        network.metadata = Some(ModelMetadata {
            description: Some(format!("seeded backbone (seed {})", seed)),
            input_type: Some(InputType::ImageRgb { width: grid, height: grid }),
            output_labels: None,
        });
        Backbone { pool: GridPool::new(grid, grid), network }
    }

    /// Loads weights from `path`, or falls back to the built-in seeded
    /// backbone.
    pub fn load_or_default(path: Option<&Path>) -> Result<Backbone> {
        match path {
            Some(path) => {
                let backbone = Backbone::from_network(Network::load_json(path)?)?;
                info!(
                    "loaded backbone from {} ({}-d embeddings, {} classes)",
                    path.display(),
                    backbone.embedding_dim(),
                    backbone.network.n_classes()
                );
                Ok(backbone)
            }
            None => Ok(Backbone::default()),
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn pool(&self) -> GridPool {
        self.pool
    }

    fn pooled(&self, image: &ImageTensor) -> Result<Vec<f64>> {
        if !self.pool.fits(image) {
            return Err(Error::InvalidBackbone(format!(
                "{}x{} pooling grid does not fit a {}x{} image",
                self.pool.grid_w, self.pool.grid_h, image.width, image.height
            )));
        }
        Ok(self.pool.forward(image))
    }
}

impl Default for Backbone {
    fn default() -> Self {
        Backbone::seeded(DEFAULT_GRID, &DEFAULT_HIDDEN, DEFAULT_CLASSES, DEFAULT_BACKBONE_SEED)
    }
}

impl Scorer for Backbone {
    fn embedding_dim(&self) -> usize {
        self.network.embedding_dim()
    }

    fn embed(&self, image: &ImageTensor) -> Result<Vec<f64>> {
        Ok(self.network.embed(&self.pooled(image)?))
    }
}

impl Classifier for Backbone {
    fn probabilities(&self, image: &ImageTensor) -> Result<Vec<f64>> {
        Ok(self.network.forward(&self.pooled(image)?))
    }

    fn loss_gradient(&self, image: &ImageTensor, class: usize) -> Result<Vec<f64>> {
        let grad = self.network.input_gradient(&self.pooled(image)?, class);
        Ok(self.pool.backward(&grad, image.width, image.height))
    }
}
