use log::info;

use crate::cluster::{synthetic_features, KMeans, KMeansFit};
use crate::error::Result;
use crate::pipeline::{FeatureSource, TrainerConfig};
use crate::records::read_features;

/// Builds the feature matrix named by `source`.
pub fn load_features(source: &FeatureSource, seed: u64) -> Result<Vec<Vec<f64>>> {
    match source {
        FeatureSource::Csv(path) => {
            let rows = read_features(path)?;
            info!("read {} feature row(s) from {}", rows.len(), path.display());
            Ok(rows.into_iter().map(|r| r.values).collect())
        }
        FeatureSource::Synthetic { n_samples, n_features } => {
            info!("using {}x{} synthetic placeholder features", n_samples, n_features);
            Ok(synthetic_features(*n_samples, *n_features, seed))
        }
    }
}

/// Fits k-means per `config` and writes the model JSON.
pub fn run_trainer(config: &TrainerConfig) -> Result<KMeansFit> {
    let data = load_features(&config.source, config.random_state)?;
    let fit = KMeans::new(config.n_clusters, config.random_state).fit(&data)?;
    fit.model.save_json(&config.output)?;
    Ok(fit)
}
