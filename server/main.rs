//! Cluster prediction server.
//!
//! Accepts `POST /api/predict` with a multipart upload in the `file` field
//! and answers with the cluster label of the image as JSON. `GET /` serves
//! a small upload page for that endpoint.
//!
//! Run with:
//!   cargo run --bin serve -- --model_path models/kmeans_model.json
mod handlers;
mod render;
mod routes;
mod state;
mod util;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueHint};
use ferrite_cluster::cluster::ClusterModel;
use ferrite_cluster::features::Backbone;
use ferrite_cluster::logging;
use log::info;
use tiny_http::Server;

use state::ServerState;

type DynError = Box<dyn Error + Send + Sync>;

/// Serve cluster predictions over HTTP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the cluster model JSON
    #[arg(long = "model_path", value_hint = ValueHint::FilePath)]
    model_path: PathBuf,

    /// Backbone network JSON; the built-in seeded backbone when omitted
    #[arg(long = "backbone_path", value_hint = ValueHint::FilePath)]
    backbone_path: Option<PathBuf>,

    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), DynError> {
    let cli = Cli::parse();
    logging::init();

    let model = ClusterModel::load_json(&cli.model_path)?;
    let backbone = Backbone::load_or_default(cli.backbone_path.as_deref())?;
    let shared_state = Arc::new(ServerState::new(backbone, model)?);

    let server = Server::http(cli.addr.as_str())?;
    info!("listening on http://{}", cli.addr);

    // One thread per request; the state is immutable so no lock is needed.
    for request in server.incoming_requests() {
        let state = Arc::clone(&shared_state);
        std::thread::spawn(move || {
            routes::dispatch(request, state);
        });
    }
    Ok(())
}
