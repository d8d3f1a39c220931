use std::path::PathBuf;

use crate::attack::DEFAULT_EPSILONS;
use crate::images::IMAGE_SIZE;

pub const DEFAULT_PREDICTIONS_CSV: &str = "predictions.csv";
pub const DEFAULT_PERTURBED_CSV: &str = "perturbed_predictions.csv";
pub const DEFAULT_PERTURBED_DIR: &str = "perturbed_images";
pub const DEFAULT_FEATURES_CSV: &str = "features.csv";
pub const DEFAULT_MODEL_OUTPUT: &str = "models/kmeans_model.json";

/// Settings for one inference run.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub test_dir: PathBuf,
    pub output_csv: PathBuf,
    pub image_size: u32,
}

impl InferenceConfig {
    pub fn new(test_dir: impl Into<PathBuf>) -> Self {
        InferenceConfig {
            test_dir: test_dir.into(),
            output_csv: PathBuf::from(DEFAULT_PREDICTIONS_CSV),
            image_size: IMAGE_SIZE,
        }
    }
}

/// Settings for one adversarial run.
#[derive(Debug, Clone)]
pub struct AdversarialConfig {
    pub test_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_csv: PathBuf,
    pub image_size: u32,
    /// FGSM step sizes, tried smallest first.
    pub epsilons: Vec<f64>,
}

impl AdversarialConfig {
    pub fn new(test_dir: impl Into<PathBuf>) -> Self {
        AdversarialConfig {
            test_dir: test_dir.into(),
            output_dir: PathBuf::from(DEFAULT_PERTURBED_DIR),
            output_csv: PathBuf::from(DEFAULT_PERTURBED_CSV),
            image_size: IMAGE_SIZE,
            epsilons: DEFAULT_EPSILONS.to_vec(),
        }
    }
}

/// Settings for exporting embeddings.
#[derive(Debug, Clone)]
pub struct FeatureExportConfig {
    pub test_dir: PathBuf,
    pub output_csv: PathBuf,
    pub image_size: u32,
}

impl FeatureExportConfig {
    pub fn new(test_dir: impl Into<PathBuf>) -> Self {
        FeatureExportConfig {
            test_dir: test_dir.into(),
            output_csv: PathBuf::from(DEFAULT_FEATURES_CSV),
            image_size: IMAGE_SIZE,
        }
    }
}

/// Where the trainer takes its feature matrix from.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSource {
    /// Rows of a feature CSV (e.g. written by `extract-features`).
    Csv(PathBuf),
    /// Uniform [0, 1) placeholder data drawn from the trainer seed.
    Synthetic { n_samples: usize, n_features: usize },
}

/// Settings for fitting and saving a cluster model.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub source: FeatureSource,
    pub n_clusters: usize,
    pub random_state: u64,
    pub output: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            source: FeatureSource::Synthetic { n_samples: 100, n_features: 4 },
            n_clusters: 2,
            random_state: 42,
            output: PathBuf::from(DEFAULT_MODEL_OUTPUT),
        }
    }
}
