use std::path::PathBuf;

use thiserror::Error;

/// Unrecoverable failures. Per-image problems never surface here; they are
/// carried as tagged outcomes by the loader and the attack.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid cluster model: {0}")]
    InvalidModel(String),

    #[error("invalid backbone: {0}")]
    InvalidBackbone(String),

    #[error("embedding has {actual} dimensions but the cluster model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid CSV: {0}")]
    InvalidCsv(String),

    #[error("k-means: {0}")]
    Training(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
