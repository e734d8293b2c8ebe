use crate::math::matrix::Matrix;
use crate::optim::Optimizer;

/// Plain gradient descent: `p -= lr * g`.
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn update(&mut self, _slot: usize, param: &mut Matrix, grad: &Matrix) {
        for (p, g) in param.data.iter_mut().zip(&grad.data) {
            *p -= self.learning_rate * g;
        }
    }
}
