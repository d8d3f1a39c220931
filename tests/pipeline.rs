use std::fs;

use ferrite_cluster::cluster::ClusterModel;
use ferrite_cluster::features::{Backbone, Scorer};
use ferrite_cluster::pipeline::features::ExportOutcome;
use ferrite_cluster::pipeline::{
    run_feature_export, run_inference, run_trainer, FeatureExportConfig, FeatureSource,
    InferenceConfig, RunOutcome, TrainerConfig,
};
use ferrite_cluster::records::{read_features, read_predictions};
use image::{Rgb, RgbImage};
use tempfile::tempdir;

fn small_backbone() -> Backbone {
    Backbone::seeded(4, &[16, 8], 5, 3)
}

#[test]
fn broken_files_are_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    RgbImage::from_pixel(10, 10, Rgb([90, 90, 90])).save(dir.path().join("ok.png")).unwrap();
    fs::write(dir.path().join("bad.jpg"), b"\xff\xd8 truncated").unwrap();
    fs::write(dir.path().join("readme.md"), "ignored").unwrap();

    let backbone = small_backbone();
    let model = ClusterModel::new(0, vec![vec![0.0; 8], vec![1.0; 8]]).unwrap();
    let mut config = InferenceConfig::new(dir.path());
    config.output_csv = dir.path().join("out.csv");
    config.image_size = 16;

    let summary = match run_inference(&config, &backbone, &model).unwrap() {
        RunOutcome::Completed(summary) => summary,
        RunOutcome::NoValidImages => panic!("ok.png should load"),
    };
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.null_labels(), 0);

    let rows = read_predictions(&config.output_csv).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].image_id, "ok");
}

#[test]
fn exported_features_train_a_matching_model() {
    let dir = tempdir().unwrap();
    let images = dir.path().join("imgs");
    fs::create_dir(&images).unwrap();
    for (name, color) in [("a", [255, 0, 0]), ("b", [0, 255, 0]), ("c", [0, 0, 255]), ("d", [250, 10, 5])] {
        RgbImage::from_pixel(8, 8, Rgb(color)).save(images.join(format!("{}.png", name))).unwrap();
    }

    let backbone = small_backbone();
    let mut export = FeatureExportConfig::new(&images);
    export.output_csv = dir.path().join("features.csv");
    export.image_size = 8;
    match run_feature_export(&export, &backbone).unwrap() {
        ExportOutcome::Written { rows, dim } => {
            assert_eq!(rows, 4);
            assert_eq!(dim, backbone.embedding_dim());
        }
        ExportOutcome::NoValidImages => panic!("images should load"),
    }

    let features = read_features(&export.output_csv).unwrap();
    assert_eq!(features.iter().map(|r| r.id.as_deref()).collect::<Vec<_>>(),
        [Some("a"), Some("b"), Some("c"), Some("d")]);

    let config = TrainerConfig {
        source: FeatureSource::Csv(export.output_csv.clone()),
        n_clusters: 2,
        random_state: 42,
        output: dir.path().join("models").join("kmeans_model.json"),
    };
    let fit = run_trainer(&config).unwrap();
    assert_eq!(fit.labels.len(), 4);

    let reloaded = ClusterModel::load_json(&config.output).unwrap();
    assert_eq!(reloaded, fit.model);
    assert_eq!(reloaded.dim(), backbone.embedding_dim());
}

#[test]
fn empty_directory_reports_no_valid_images() {
    let dir = tempdir().unwrap();
    let model = ClusterModel::new(0, vec![vec![0.0; 8]]).unwrap();
    let mut config = InferenceConfig::new(dir.path());
    config.output_csv = dir.path().join("predictions.csv");

    let outcome = run_inference(&config, &small_backbone(), &model).unwrap();
    assert!(matches!(outcome, RunOutcome::NoValidImages));
    assert!(!config.output_csv.exists());
}
