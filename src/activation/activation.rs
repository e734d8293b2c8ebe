use serde::{Serialize, Deserialize};
use std::fmt;

use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    #[serde(rename = "relu")]
    ReLU,
    Sigmoid,
    /// Raw outputs (logits when used on the last layer).
    Identity,
    /// Vector-valued; applied per row by `apply()`, never element-wise.
    Softmax,
}

impl ActivationFunction {
    /// Element-wise activation. `Softmax` is not element-wise; use `apply()`.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
        }
    }

    /// Element-wise derivative at the pre-activation `x`.
    ///
    /// `Softmax` returns 1.0: it only ever sits on the output layer, where the
    /// loss hands back the combined softmax + cross-entropy gradient already.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Identity | ActivationFunction::Softmax => 1.0,
        }
    }

    /// Applies the activation to a whole `(batch, units)` matrix.
    pub fn apply(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Softmax => softmax_rows(z),
            _ => z.map(|x| self.function(x)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::ReLU => "relu",
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::Identity => "linear",
            ActivationFunction::Softmax => "softmax",
        }
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row-wise softmax, shifted by the row maximum so `exp` cannot overflow.
pub fn softmax_rows(z: &Matrix) -> Matrix {
    let mut out = z.clone();
    for r in 0..out.rows {
        let row = out.row_mut(r);
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for x in row.iter_mut() {
            *x = (*x - max).exp();
            sum += *x;
        }
        for x in row.iter_mut() {
            *x /= sum;
        }
    }
    out
}
