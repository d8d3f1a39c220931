use serde::{Deserialize, Serialize};

/// Describes how to interpret the input fed to a Network.
/// Stored in backbone JSON; the feature extractor reads it to decide how an
/// image tensor is reduced to the network's input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputType {
    /// Plain feature row; cannot be fed from an image.
    Numeric,
    /// RGB image average-pooled to width×height, values in [0, 1],
    /// flattened as R,G,B,...
    ImageRgb { width: u32, height: u32 },
}

/// Optional annotations attached to a saved Network.
/// All fields are Option<> so bare weight files deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    pub input_type: Option<InputType>,
    /// Human-readable class labels for the classification head.
    pub output_labels: Option<Vec<String>>,
}
