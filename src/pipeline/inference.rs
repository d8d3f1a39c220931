use log::debug;

use crate::cluster::Labeler;
use crate::error::Result;
use crate::features::Scorer;
use crate::images::ImageRecord;
use crate::pipeline::{check_dims, load_batch, InferenceConfig, RunOutcome, RunSummary};
use crate::records::{write_predictions, PredictionRecord};

/// Embeds and labels every record, preserving order.
pub fn predict_records<S, L>(records: &[ImageRecord], scorer: &S, labeler: &L) -> Result<Vec<PredictionRecord>>
where
    S: Scorer + ?Sized,
    L: Labeler + ?Sized,
{
    records.iter()
        .map(|record| {
            let embedding = scorer.embed(&record.tensor)?;
            let label = labeler.assign(&embedding);
            debug!("{} -> cluster {}", record.id, label);
            Ok(PredictionRecord::new(record.id.clone(), Some(label)))
        })
        .collect()
}

/// Loads `config.test_dir`, labels every image and writes the CSV.
pub fn run_inference<S, L>(config: &InferenceConfig, scorer: &S, labeler: &L) -> Result<RunOutcome>
where
    S: Scorer + ?Sized,
    L: Labeler + ?Sized,
{
    let Some(loaded) = load_batch(&config.test_dir, config.image_size)? else {
        return Ok(RunOutcome::NoValidImages);
    };
    check_dims(scorer, labeler)?;

    let records = predict_records(&loaded.records, scorer, labeler)?;
    write_predictions(&config.output_csv, &records)?;

    Ok(RunOutcome::Completed(RunSummary {
        output_csv: config.output_csv.clone(),
        records,
        skipped: loaded.skipped,
    }))
}
