use std::path::PathBuf;

use clap::{Parser, ValueHint};
use ferrite_cluster::attack::DEFAULT_EPSILONS;
use ferrite_cluster::cluster::ClusterModel;
use ferrite_cluster::features::Backbone;
use ferrite_cluster::pipeline::config::{DEFAULT_PERTURBED_CSV, DEFAULT_PERTURBED_DIR};
use ferrite_cluster::pipeline::{run_adversarial, AdversarialConfig, RunOutcome, NO_VALID_IMAGES};
use ferrite_cluster::{logging, Result};
use log::info;

/// Perturb each image with FGSM and cluster the perturbed copies.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the cluster model JSON
    #[arg(long = "model_path", value_hint = ValueHint::FilePath)]
    model_path: PathBuf,

    /// Directory of test images
    #[arg(long = "test_dir", value_hint = ValueHint::DirPath)]
    test_dir: PathBuf,

    /// Directory receiving `<id>_adv.jpg` files
    #[arg(long = "output_dir", default_value = DEFAULT_PERTURBED_DIR)]
    output_dir: PathBuf,

    /// Where to write the perturbed predictions CSV
    #[arg(long = "output_csv", default_value = DEFAULT_PERTURBED_CSV)]
    output_csv: PathBuf,

    /// Backbone network JSON; the built-in seeded backbone when omitted
    #[arg(long = "backbone_path", value_hint = ValueHint::FilePath)]
    backbone_path: Option<PathBuf>,

    /// Comma-separated FGSM step sizes
    #[arg(long, value_delimiter = ',')]
    epsilons: Option<Vec<f64>>,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    let model = ClusterModel::load_json(&cli.model_path)?;
    let backbone = Backbone::load_or_default(cli.backbone_path.as_deref())?;

    let mut config = AdversarialConfig::new(cli.test_dir);
    config.output_dir = cli.output_dir;
    config.output_csv = cli.output_csv;
    config.epsilons = cli.epsilons.unwrap_or_else(|| DEFAULT_EPSILONS.to_vec());

    match run_adversarial(&config, &backbone, &model)? {
        RunOutcome::NoValidImages => println!("{NO_VALID_IMAGES}"),
        RunOutcome::Completed(summary) => {
            info!(
                "{} of {} image(s) could not be perturbed",
                summary.null_labels(),
                summary.records.len()
            );
            println!("Adversarial predictions saved to {}", summary.output_csv.display());
        }
    }
    Ok(())
}
