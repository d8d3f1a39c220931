use std::path::PathBuf;

use clap::{Parser, ValueHint};
use ferrite_cluster::pipeline::config::DEFAULT_MODEL_OUTPUT;
use ferrite_cluster::pipeline::{run_trainer, FeatureSource, TrainerConfig};
use ferrite_cluster::{logging, Result};
use log::info;

/// Fit a k-means cluster model and save it as JSON.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Feature CSV to fit on; synthetic placeholder data when omitted
    #[arg(long = "features_csv", value_hint = ValueHint::FilePath)]
    features_csv: Option<PathBuf>,

    #[arg(long = "n_clusters", default_value_t = 2)]
    n_clusters: usize,

    #[arg(long = "random_state", default_value_t = 42)]
    random_state: u64,

    /// Rows of synthetic data
    #[arg(long = "n_samples", default_value_t = 100)]
    n_samples: usize,

    /// Columns of synthetic data
    #[arg(long = "n_features", default_value_t = 4)]
    n_features: usize,

    /// Where to write the model JSON
    #[arg(long, default_value = DEFAULT_MODEL_OUTPUT)]
    output: PathBuf,
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

    let source = match cli.features_csv {
        Some(path) => FeatureSource::Csv(path),
        None => FeatureSource::Synthetic {
            n_samples: cli.n_samples,
            n_features: cli.n_features,
        },
    };
    let config = TrainerConfig {
        source,
        n_clusters: cli.n_clusters,
        random_state: cli.random_state,
        output: cli.output,
    };

    let fit = run_trainer(&config)?;
    info!("inertia {:.6} after {} iteration(s)", fit.inertia, fit.n_iter);
    println!("KMeans model saved to {}", config.output.display());
    Ok(())
}
