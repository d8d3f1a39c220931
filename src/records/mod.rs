pub mod csv;
pub mod prediction;

pub use self::csv::{read_features, write_features, FeatureRow};
pub use prediction::{read_predictions, write_predictions, PredictionRecord};
