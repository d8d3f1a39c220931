pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod images;
pub mod features;
pub mod attack;
pub mod cluster;
pub mod records;
pub mod pipeline;
pub mod logging;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{InputType, ModelMetadata, Network};
pub use images::{ImageRecord, ImageTensor};
pub use features::{Backbone, Scorer};
pub use attack::{AttackOutcome, Classifier, Fgsm};
pub use cluster::{ClusterModel, KMeans, Labeler};
pub use records::PredictionRecord;
pub use pipeline::{RunOutcome, RunSummary, NO_VALID_IMAGES};
pub use error::{Error, Result};
