//! End-to-end passes over a directory of images.
//!
//! Each pipeline takes its configuration and collaborators as parameters,
//! runs one linear pass and reports a `RunOutcome`. An input directory with
//! no decodable image yields `RunOutcome::NoValidImages` and writes nothing.

pub mod adversarial;
pub mod config;
pub mod features;
pub mod inference;
pub mod trainer;

use std::path::{Path, PathBuf};

use log::info;

use crate::cluster::Labeler;
use crate::error::{Error, Result};
use crate::features::Scorer;
use crate::images::{collect_loaded, load_dir, LoadedImages};
use crate::records::PredictionRecord;

pub use adversarial::run_adversarial;
pub use config::{AdversarialConfig, FeatureExportConfig, FeatureSource, InferenceConfig, TrainerConfig};
pub use features::run_feature_export;
pub use inference::run_inference;
pub use trainer::run_trainer;

pub const NO_VALID_IMAGES: &str = "No valid images found in the test directory.";

#[derive(Debug)]
pub enum RunOutcome {
    NoValidImages,
    Completed(RunSummary),
}

#[derive(Debug)]
pub struct RunSummary {
    pub output_csv: PathBuf,
    pub records: Vec<PredictionRecord>,
    /// Files the loader could not decode.
    pub skipped: usize,
}

impl RunSummary {
    pub fn null_labels(&self) -> usize {
        self.records.iter().filter(|r| r.label.is_none()).count()
    }
}

/// Loads the directory; `None` when nothing decoded.
pub(crate) fn load_batch(dir: &Path, image_size: u32) -> Result<Option<LoadedImages>> {
    let loaded = collect_loaded(load_dir(dir, image_size)?);
    info!(
        "loaded {} image(s) from {} ({} skipped)",
        loaded.records.len(),
        dir.display(),
        loaded.skipped
    );
    if loaded.records.is_empty() {
        Ok(None)
    } else {
        Ok(Some(loaded))
    }
}

/// Fails unless the scorer produces what the labeler expects.
pub fn check_dims<S, L>(scorer: &S, labeler: &L) -> Result<()>
where
    S: Scorer + ?Sized,
    L: Labeler + ?Sized,
{
    if scorer.embedding_dim() != labeler.dim() {
        return Err(Error::DimensionMismatch {
            expected: labeler.dim(),
            actual: scorer.embedding_dim(),
        });
    }
    Ok(())
}
