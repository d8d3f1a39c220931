use std::path::Path;

use log::{info, warn};

use crate::attack::{AttackOutcome, Classifier, Fgsm};
use crate::cluster::Labeler;
use crate::error::{Error, Result};
use crate::features::Scorer;
use crate::images::ImageRecord;
use crate::pipeline::{check_dims, load_batch, AdversarialConfig, RunOutcome, RunSummary};
use crate::records::{write_predictions, PredictionRecord};

/// File name of the perturbed copy of image `id`.
pub fn adversarial_file_name(id: &str) -> String {
    format!("{}_adv.jpg", id)
}

/// Attacks one image. On success the perturbed image is labeled and saved
/// into `output_dir`; on failure nothing is written and the label is `None`.
pub fn perturb_record<M, L>(
    record: &ImageRecord,
    fgsm: &Fgsm,
    model: &M,
    labeler: &L,
    output_dir: &Path,
) -> Result<PredictionRecord>
where
    M: Scorer + Classifier + ?Sized,
    L: Labeler + ?Sized,
{
    match fgsm.run(model, &record.tensor)? {
        AttackOutcome::Success { adversarial, epsilon, original_class, adversarial_class } => {
            let label = labeler.assign(&model.embed(&adversarial)?);
            let path = output_dir.join(adversarial_file_name(&record.id));
            adversarial.save_jpeg(&path)?;
            info!(
                "{}: class {} -> {} at epsilon {}, cluster {}",
                record.id, original_class, adversarial_class, epsilon, label
            );
            Ok(PredictionRecord::new(record.id.clone(), Some(label)))
        }
        AttackOutcome::Failure { original_class } => {
            warn!(
                "Failed to generate adversarial example for {} (class {})",
                record.id, original_class
            );
            Ok(PredictionRecord::new(record.id.clone(), None))
        }
    }
}

/// Loads `config.test_dir`, perturbs every image, saves the perturbed images
/// and writes the CSV once all images are processed.
pub fn run_adversarial<M, L>(config: &AdversarialConfig, model: &M, labeler: &L) -> Result<RunOutcome>
where
    M: Scorer + Classifier + ?Sized,
    L: Labeler + ?Sized,
{
    let Some(loaded) = load_batch(&config.test_dir, config.image_size)? else {
        return Ok(RunOutcome::NoValidImages);
    };
    check_dims(model, labeler)?;

    ensure_dir(&config.output_dir)?;
    let fgsm = Fgsm::new(&config.epsilons);

    let records = loaded.records.iter()
        .map(|record| perturb_record(record, &fgsm, model, labeler, &config.output_dir))
        .collect::<Result<Vec<_>>>()?;
    write_predictions(&config.output_csv, &records)?;

    Ok(RunOutcome::Completed(RunSummary {
        output_csv: config.output_csv.clone(),
        records,
        skipped: loaded.skipped,
    }))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterModel;
    use crate::images::ImageTensor;

    /// Classifies by whether the red mean is above one half; embeds as the
    /// red mean.
    struct RedSplit;

    impl RedSplit {
        fn red(image: &ImageTensor) -> f64 {
            let reds: Vec<f64> = image.data.iter().step_by(3).copied().collect();
            reds.iter().sum::<f64>() / reds.len() as f64
        }
    }

    impl Scorer for RedSplit {
        fn embedding_dim(&self) -> usize {
            1
        }

        fn embed(&self, image: &ImageTensor) -> Result<Vec<f64>> {
            Ok(vec![Self::red(image)])
        }
    }

    impl Classifier for RedSplit {
        fn probabilities(&self, image: &ImageTensor) -> Result<Vec<f64>> {
            let p = if Self::red(image) > 0.5 { 0.9 } else { 0.1 };
            Ok(vec![1.0 - p, p])
        }

        fn loss_gradient(&self, image: &ImageTensor, class: usize) -> Result<Vec<f64>> {
            // Moving red away from the predicted side raises the loss.
            let g = if class == 1 { -1.0 } else { 1.0 };
            Ok((0..image.data.len()).map(|i| if i % 3 == 0 { g } else { 0.0 }).collect())
        }
    }

    fn record(id: &str, red: f64) -> ImageRecord {
        ImageRecord { id: id.into(), tensor: ImageTensor::new(2, 2, [red, 0.2, 0.2].repeat(4)) }
    }

    #[test]
    fn successful_attack_writes_image_and_label() {
        let dir = tempfile::tempdir().unwrap();
        let model = ClusterModel::new(0, vec![vec![0.0], vec![1.0]]).unwrap();
        let fgsm = Fgsm::new(&[0.1]);

        let row = perturb_record(&record("near", 0.55), &fgsm, &RedSplit, &model, dir.path()).unwrap();
        assert_eq!(row, PredictionRecord::new("near", Some(0)));
        assert!(dir.path().join("near_adv.jpg").exists());
    }

    #[test]
    fn failed_attack_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let model = ClusterModel::new(0, vec![vec![0.0], vec![1.0]]).unwrap();
        let fgsm = Fgsm::new(&[0.1]);

        let row = perturb_record(&record("far", 0.95), &fgsm, &RedSplit, &model, dir.path()).unwrap();
        assert_eq!(row, PredictionRecord::new("far", None));
        assert!(!dir.path().join("far_adv.jpg").exists());
    }

    #[test]
    fn file_name_appends_suffix() {
        assert_eq!(adversarial_file_name("cat"), "cat_adv.jpg");
    }
}
