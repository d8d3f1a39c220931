use crate::error::Result;
use crate::features::Scorer;
use crate::pipeline::{load_batch, FeatureExportConfig};
use crate::records::write_features;

/// Rows written by a feature export.
#[derive(Debug)]
pub enum ExportOutcome {
    NoValidImages,
    Written { rows: usize, dim: usize },
}

/// Embeds every image in `config.test_dir` and writes `image_id,f0,...`.
pub fn run_feature_export<S: Scorer + ?Sized>(config: &FeatureExportConfig, scorer: &S) -> Result<ExportOutcome> {
    let Some(loaded) = load_batch(&config.test_dir, config.image_size)? else {
        return Ok(ExportOutcome::NoValidImages);
    };

    let rows = loaded.records.iter()
        .map(|r| Ok((r.id.clone(), scorer.embed(&r.tensor)?)))
        .collect::<Result<Vec<_>>>()?;
    write_features(&config.output_csv, &rows)?;

    Ok(ExportOutcome::Written { rows: rows.len(), dim: scorer.embedding_dim() })
}
