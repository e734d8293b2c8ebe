use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Hyperparameters for `Model::fit`.
///
/// - `epochs`: full passes over the training data
/// - `batch_size`: samples per gradient step
/// - `shuffle`: reshuffle sample order at the start of every epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
}

impl TrainConfig {
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig { epochs, batch_size, shuffle: true }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_owned()));
        }
        Ok(())
    }

    /// Number of batches needed to cover `n` samples.
    pub fn steps_per_epoch(&self, n: usize) -> usize {
        n.div_ceil(self.batch_size.max(1))
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(10, 32)
    }
}
