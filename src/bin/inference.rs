use std::path::PathBuf;

use clap::{Parser, ValueHint};
use ferrite_cluster::cluster::ClusterModel;
use ferrite_cluster::features::Backbone;
use ferrite_cluster::pipeline::config::DEFAULT_PREDICTIONS_CSV;
use ferrite_cluster::pipeline::{run_inference, InferenceConfig, RunOutcome, NO_VALID_IMAGES};
use ferrite_cluster::{logging, Result};

/// Assign every image in a directory to a cluster.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the cluster model JSON
    #[arg(long = "model_path", value_hint = ValueHint::FilePath)]
    model_path: PathBuf,

    /// Directory of test images
    #[arg(long = "test_dir", value_hint = ValueHint::DirPath)]
    test_dir: PathBuf,

    /// Where to write the predictions CSV
    #[arg(long = "output_csv", default_value = DEFAULT_PREDICTIONS_CSV)]
    output_csv: PathBuf,

    /// Backbone network JSON; the built-in seeded backbone when omitted
    #[arg(long = "backbone_path", value_hint = ValueHint::FilePath)]
    backbone_path: Option<PathBuf>,
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

    let mut config = InferenceConfig::new(cli.test_dir);
    config.output_csv = cli.output_csv;

    match run_inference(&config, &backbone, &model)? {
        RunOutcome::NoValidImages => println!("{NO_VALID_IMAGES}"),
        RunOutcome::Completed(summary) => {
            println!("Predictions saved to {}", summary.output_csv.display());
        }
    }
    Ok(())
}
