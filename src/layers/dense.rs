use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Fully connected layer: `a = f(x W + b)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    /// Shape `(input_size, units)`.
    pub weights: Matrix,
    /// Shape `(1, units)`.
    pub biases: Matrix,
    pub activator: ActivationFunction,
    #[serde(skip)]
    cache: Option<ForwardCache>,
}

/// Values from the last training forward pass that backprop needs.
#[derive(Debug, Clone)]
struct ForwardCache {
    input: Matrix,
    pre_activation: Matrix,
}

/// Parameter gradients for one dense layer, averaged over the batch by the loss.
#[derive(Debug, Clone)]
pub struct DenseGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl Dense {
    /// He init for ReLU, Xavier for everything else; biases start at zero.
    pub fn new<R: Rng + ?Sized>(
        units: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Dense {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, units, rng),
            _ => Matrix::xavier(input_size, units, rng),
        };
        Dense {
            weights,
            biases: Matrix::zeros(1, units),
            activator: activation,
            cache: None,
        }
    }

    pub fn units(&self) -> usize {
        self.weights.cols
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn param_count(&self) -> usize {
        self.weights.data.len() + self.biases.data.len()
    }

    fn linear(&self, input: &Matrix) -> Result<Matrix> {
        if input.cols != self.input_size() {
            return Err(Error::Shape(format!(
                "dense layer expects {} inputs per sample, got {}",
                self.input_size(), input.cols
            )));
        }
        Ok((input * &self.weights).add_row(&self.biases))
    }

    /// Training forward pass; keeps input and pre-activation for `backward`.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        let z = self.linear(input)?;
        let a = self.activator.apply(&z);
        self.cache = Some(ForwardCache { input: input.clone(), pre_activation: z });
        Ok(a)
    }

    /// Inference forward pass; leaves the cache untouched.
    pub fn infer(&self, input: &Matrix) -> Result<Matrix> {
        let z = self.linear(input)?;
        Ok(self.activator.apply(&z))
    }

    /// Backpropagates `delta` (dL/da for this layer's output).
    ///
    /// Returns the parameter gradients and dL/dx for the layer below.
    pub fn backward(&self, delta: &Matrix) -> Result<(DenseGradients, Matrix)> {
        let cache = self.cache.as_ref().ok_or_else(|| {
            Error::Shape("dense backward called without a preceding forward pass".to_owned())
        })?;
        if delta.rows != cache.pre_activation.rows || delta.cols != self.units() {
            return Err(Error::Shape(format!(
                "dense backward expects a {}x{} delta, got {}x{}",
                cache.pre_activation.rows, self.units(), delta.rows, delta.cols
            )));
        }

        // dz = da ⊙ f'(z)
        let act_derivative = cache.pre_activation.map(|x| self.activator.derivative(x));
        let layer_delta = delta.hadamard(&act_derivative);

        let grads = DenseGradients {
            weights: &cache.input.transpose() * &layer_delta,
            biases: layer_delta.sum_rows(),
        };
        let input_delta = &layer_delta * &self.weights.transpose();
        Ok((grads, input_delta))
    }
}
