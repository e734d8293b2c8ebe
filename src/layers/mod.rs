pub mod dense;
pub mod flatten;

use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::matrix::Matrix;

pub use dense::{Dense, DenseGradients};
pub use flatten::Flatten;

/// One stage of a sequential network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Flatten(Flatten),
    Dense(Dense),
}

impl Layer {
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        match self {
            Layer::Flatten(f) => f.forward(input),
            Layer::Dense(d) => d.forward(input),
        }
    }

    pub fn infer(&self, input: &Matrix) -> Result<Matrix> {
        match self {
            Layer::Flatten(f) => f.forward(input),
            Layer::Dense(d) => d.infer(input),
        }
    }

    pub fn output_size(&self) -> usize {
        match self {
            Layer::Flatten(f) => f.output_size(),
            Layer::Dense(d) => d.units(),
        }
    }

    pub fn param_count(&self) -> usize {
        match self {
            Layer::Flatten(_) => 0,
            Layer::Dense(d) => d.param_count(),
        }
    }

    /// Class name shown in the model summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Flatten(_) => "Flatten",
            Layer::Dense(_) => "Dense",
        }
    }

    /// Base for auto-generated layer names (`dense`, `dense_1`, ...).
    pub fn base_name(&self) -> &'static str {
        match self {
            Layer::Flatten(_) => "flatten",
            Layer::Dense(_) => "dense",
        }
    }
}
