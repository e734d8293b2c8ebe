use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Reshapes each sample to a flat vector. Samples already travel as flat
/// rows, so this only checks the width against the declared shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flatten {
    pub input_shape: Vec<usize>,
}

impl Flatten {
    pub fn new(input_shape: Vec<usize>) -> Flatten {
        Flatten { input_shape }
    }

    pub fn output_size(&self) -> usize {
        self.input_shape.iter().product()
    }

    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        if input.cols != self.output_size() {
            return Err(Error::Shape(format!(
                "flatten expects samples of shape {:?} ({} values), got {}",
                self.input_shape, self.output_size(), input.cols
            )));
        }
        Ok(input.clone())
    }
}
