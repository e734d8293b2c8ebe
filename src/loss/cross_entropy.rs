use serde::{Serialize, Deserialize};

use crate::activation::activation::{softmax_rows, ActivationFunction};
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Clamp inside `ln()` so a zero probability cannot produce `-inf`.
const EPS: f64 = 1e-7;

/// Categorical cross-entropy against integer class labels.
///
/// With `from_logits = false` the network output is expected to be softmax
/// probabilities already; with `from_logits = true` it is raw scores and the
/// softmax happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SparseCategoricalCrossentropy {
    pub from_logits: bool,
}

impl SparseCategoricalCrossentropy {
    pub fn new(from_logits: bool) -> Self {
        SparseCategoricalCrossentropy { from_logits }
    }

    /// Checks that the output layer's activation matches `from_logits`.
    ///
    /// The gradient returned by `gradient()` is taken with respect to the
    /// output layer's pre-activation, which is only correct for a softmax
    /// layer (probabilities) or an identity layer (logits).
    pub fn check_output_activation(&self, activation: ActivationFunction) -> Result<()> {
        match (self.from_logits, activation) {
            (false, ActivationFunction::Softmax) | (true, ActivationFunction::Identity) => Ok(()),
            (false, other) => Err(Error::Config(format!(
                "cross-entropy on probabilities needs a softmax output layer, found {}",
                other
            ))),
            (true, other) => Err(Error::Config(format!(
                "cross-entropy from logits needs a linear output layer, found {}",
                other
            ))),
        }
    }

    /// Class probabilities for a batch of network outputs.
    pub fn probabilities(&self, outputs: &Matrix) -> Matrix {
        if self.from_logits {
            softmax_rows(outputs)
        } else {
            outputs.clone()
        }
    }

    /// Mean loss over the batch: `-mean(ln p[label])`.
    pub fn loss(&self, outputs: &Matrix, labels: &[usize]) -> Result<f64> {
        check_labels(outputs, labels)?;
        if labels.is_empty() {
            return Ok(0.0);
        }
        let probs = self.probabilities(outputs);
        let total: f64 = labels.iter().enumerate()
            .map(|(i, &label)| -probs.get(i, label).clamp(EPS, 1.0 - EPS).ln())
            .sum();
        Ok(total / labels.len() as f64)
    }

    /// Gradient of the mean loss w.r.t. the output layer's pre-activation.
    ///
    /// Softmax and cross-entropy combine to `(p - onehot) / batch`, whichever
    /// side the softmax sits on.
    pub fn gradient(&self, outputs: &Matrix, labels: &[usize]) -> Result<Matrix> {
        check_labels(outputs, labels)?;
        let mut grad = self.probabilities(outputs);
        let inv_batch = 1.0 / labels.len().max(1) as f64;
        for (i, &label) in labels.iter().enumerate() {
            let row = grad.row_mut(i);
            row[label] -= 1.0;
            for g in row.iter_mut() {
                *g *= inv_batch;
            }
        }
        Ok(grad)
    }
}

fn check_labels(outputs: &Matrix, labels: &[usize]) -> Result<()> {
    if outputs.rows != labels.len() {
        return Err(Error::Shape(format!(
            "{} outputs but {} labels",
            outputs.rows, labels.len()
        )));
    }
    if let Some(&bad) = labels.iter().find(|&&l| l >= outputs.cols) {
        return Err(Error::Shape(format!(
            "label {} is out of range for {} classes",
            bad, outputs.cols
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction_has_near_zero_loss() {
        let loss = SparseCategoricalCrossentropy::new(false);
        let p = Matrix::from_rows(vec![vec![0.0, 1.0, 0.0]]);
        assert!(loss.loss(&p, &[1]).unwrap() < 1e-6);
    }

    #[test]
    fn uniform_prediction_costs_ln_classes() {
        let loss = SparseCategoricalCrossentropy::new(true);
        let logits = Matrix::zeros(2, 10);
        let l = loss.loss(&logits, &[3, 7]).unwrap();
        assert!((l - 10f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn gradient_is_probabilities_minus_onehot_over_batch() {
        let loss = SparseCategoricalCrossentropy::new(false);
        let p = Matrix::from_rows(vec![vec![0.2, 0.8], vec![0.6, 0.4]]);
        let g = loss.gradient(&p, &[1, 1]).unwrap();
        let expected = [0.1, -0.1, 0.3, -0.3];
        for (a, b) in g.data.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn logits_gradient_matches_finite_difference() {
        let loss = SparseCategoricalCrossentropy::new(true);
        let z = Matrix::from_rows(vec![vec![0.3, -1.2, 2.0]]);
        let g = loss.gradient(&z, &[0]).unwrap();
        let h = 1e-6;
        for j in 0..3 {
            let mut plus = z.clone();
            plus.data[j] += h;
            let mut minus = z.clone();
            minus.data[j] -= h;
            let numeric = (loss.loss(&plus, &[0]).unwrap() - loss.loss(&minus, &[0]).unwrap()) / (2.0 * h);
            assert!((numeric - g.data[j]).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_out_of_range_labels_and_count_mismatch() {
        let loss = SparseCategoricalCrossentropy::default();
        let p = Matrix::zeros(1, 3);
        assert!(loss.loss(&p, &[3]).is_err());
        assert!(loss.gradient(&p, &[0, 1]).is_err());
    }

    #[test]
    fn output_activation_must_match_from_logits() {
        let probs = SparseCategoricalCrossentropy::new(false);
        let logits = SparseCategoricalCrossentropy::new(true);
        assert!(probs.check_output_activation(ActivationFunction::Softmax).is_ok());
        assert!(probs.check_output_activation(ActivationFunction::ReLU).is_err());
        assert!(logits.check_output_activation(ActivationFunction::Identity).is_ok());
        assert!(logits.check_output_activation(ActivationFunction::Softmax).is_err());
    }
}
