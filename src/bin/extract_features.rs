use std::path::PathBuf;

use clap::{Parser, ValueHint};
use ferrite_cluster::features::Backbone;
use ferrite_cluster::pipeline::config::DEFAULT_FEATURES_CSV;
use ferrite_cluster::pipeline::features::ExportOutcome;
use ferrite_cluster::pipeline::{run_feature_export, FeatureExportConfig, NO_VALID_IMAGES};
use ferrite_cluster::{logging, Result};

/// Write backbone embeddings for every image in a directory.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Directory of images
    #[arg(long = "test_dir", value_hint = ValueHint::DirPath)]
    test_dir: PathBuf,

    /// Where to write the feature CSV
    #[arg(long = "output_csv", default_value = DEFAULT_FEATURES_CSV)]
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

    let backbone = Backbone::load_or_default(cli.backbone_path.as_deref())?;
    let mut config = FeatureExportConfig::new(cli.test_dir);
    config.output_csv = cli.output_csv;

    match run_feature_export(&config, &backbone)? {
        ExportOutcome::NoValidImages => println!("{NO_VALID_IMAGES}"),
        ExportOutcome::Written { rows, dim } => {
            println!("Features ({rows} x {dim}) saved to {}", config.output_csv.display());
        }
    }
    Ok(())
}
