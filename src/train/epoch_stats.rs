use std::fmt;

use serde::{Serialize, Deserialize};

/// Per-epoch training statistics, handed to every callback at epoch end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Mean loss over all training samples in this epoch.
    pub loss: f64,
    /// Fraction of training samples classified correctly, in [0, 1].
    pub accuracy: f64,
    /// Wall-clock duration of this epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Everything `fit` produced, one entry per completed epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochStats>,
}

impl History {
    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }

    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.loss).collect()
    }
}

/// Result of `Model::evaluate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f64,
    pub accuracy: f64,
    /// Number of batches the evaluation ran over.
    pub batches: usize,
}

/// Keras' `verbose=2` evaluation line: `313/313 - loss: 0.3412 - accuracy: 0.8790`.
impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} - loss: {:.4} - accuracy: {:.4}",
            self.batches, self.batches, self.loss, self.accuracy
        )
    }
}
