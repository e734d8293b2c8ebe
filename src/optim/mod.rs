pub mod adam;
pub mod sgd;

use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

pub use adam::Adam;
pub use sgd::Sgd;

/// Updates parameters in place from their gradients.
///
/// Each trainable tensor is addressed by a stable `slot` index so stateful
/// optimizers can keep per-parameter moments between steps.
pub trait Optimizer {
    /// Called once per batch, before any `update` for that batch.
    fn begin_step(&mut self) {}

    fn update(&mut self, slot: usize, param: &mut Matrix, grad: &Matrix);
}

/// Serializable optimizer choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd { learning_rate: f64 },
    Adam { learning_rate: f64, beta_1: f64, beta_2: f64, epsilon: f64 },
}

impl OptimizerConfig {
    /// Adam with the usual defaults and the given learning rate.
    pub fn adam(learning_rate: f64) -> Self {
        OptimizerConfig::Adam {
            learning_rate,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-7,
        }
    }

    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            OptimizerConfig::Sgd { learning_rate } => Box::new(Sgd::new(learning_rate)),
            OptimizerConfig::Adam { learning_rate, beta_1, beta_2, epsilon } => {
                Box::new(Adam::new(learning_rate, beta_1, beta_2, epsilon))
            }
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match *self {
            OptimizerConfig::Sgd { learning_rate } | OptimizerConfig::Adam { learning_rate, .. } => learning_rate,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OptimizerConfig::Sgd { .. } => "sgd",
            OptimizerConfig::Adam { .. } => "adam",
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::adam(0.001)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_reports_name_and_learning_rate() {
        let adam = OptimizerConfig::default();
        assert_eq!((adam.name(), adam.learning_rate()), ("adam", 0.001));
        let sgd = OptimizerConfig::Sgd { learning_rate: 0.5 };
        assert_eq!((sgd.name(), sgd.learning_rate()), ("sgd", 0.5));
    }
}
