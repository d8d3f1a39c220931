use std::sync::Arc;

use ferrite_cluster::cluster::{ClusterModel, Labeler};
use ferrite_cluster::features::{Backbone, Scorer};
use ferrite_cluster::images::{decode_bytes, IMAGE_SIZE};
use ferrite_cluster::pipeline::check_dims;

/// Read-only models shared by every request thread.
pub struct ServerState {
    pub backbone: Backbone,
    pub model: ClusterModel,
}

pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(backbone: Backbone, model: ClusterModel) -> ferrite_cluster::Result<ServerState> {
        check_dims(&backbone, &model)?;
        Ok(ServerState { backbone, model })
    }

    /// Decodes uploaded bytes and returns the cluster label.
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<usize, String> {
        let tensor = decode_bytes(bytes, IMAGE_SIZE)?;
        let embedding = self.backbone.embed(&tensor).map_err(|e| e.to_string())?;
        Ok(self.model.assign(&embedding))
    }
}
