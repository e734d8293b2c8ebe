use serde::{Deserialize, Serialize};

/// Optional annotations saved with a network.
/// All fields are `Option` so models saved without them still load.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Human-readable class labels for the output layer.
    pub output_labels: Option<Vec<String>>,
}
