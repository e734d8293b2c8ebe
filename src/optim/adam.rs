use crate::math::matrix::Matrix;
use crate::optim::Optimizer;

/// Adam with bias-corrected first and second moments.
pub struct Adam {
    learning_rate: f64,
    beta_1: f64,
    beta_2: f64,
    epsilon: f64,
    /// Number of completed `begin_step` calls.
    t: i32,
    moments: Vec<Option<Moments>>,
}

struct Moments {
    m: Vec<f64>,
    v: Vec<f64>,
}

impl Adam {
    pub fn new(learning_rate: f64, beta_1: f64, beta_2: f64, epsilon: f64) -> Adam {
        Adam {
            learning_rate,
            beta_1,
            beta_2,
            epsilon,
            t: 0,
            moments: Vec::new(),
        }
    }

    fn slot(&mut self, slot: usize, len: usize) -> &mut Moments {
        if self.moments.len() <= slot {
            self.moments.resize_with(slot + 1, || None);
        }
        let entry = &mut self.moments[slot];
        if entry.as_ref().map_or(true, |m| m.m.len() != len) {
            *entry = Some(Moments { m: vec![0.0; len], v: vec![0.0; len] });
        }
        entry.get_or_insert_with(|| Moments { m: vec![0.0; len], v: vec![0.0; len] })
    }
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.t += 1;
    }

    fn update(&mut self, slot: usize, param: &mut Matrix, grad: &Matrix) {
        let t = self.t.max(1);
        let (lr, b1, b2, eps) = (self.learning_rate, self.beta_1, self.beta_2, self.epsilon);
        let correction_1 = 1.0 - b1.powi(t);
        let correction_2 = 1.0 - b2.powi(t);

        let moments = self.slot(slot, param.data.len());
        for (((p, g), m), v) in param.data.iter_mut()
            .zip(&grad.data)
            .zip(moments.m.iter_mut())
            .zip(moments.v.iter_mut())
        {
            *m = b1 * *m + (1.0 - b1) * g;
            *v = b2 * *v + (1.0 - b2) * g * g;
            let m_hat = *m / correction_1;
            let v_hat = *v / correction_2;
            *p -= lr * m_hat / (v_hat.sqrt() + eps);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_each_weight_by_about_lr() {
        // With bias correction the first update is lr * g / |g|.
        let mut adam = Adam::new(0.01, 0.9, 0.999, 1e-7);
        let mut p = Matrix::from_rows(vec![vec![1.0, 1.0]]);
        adam.begin_step();
        adam.update(0, &mut p, &Matrix::from_rows(vec![vec![3.0, -0.5]]));
        assert!((p.data[0] - 0.99).abs() < 1e-6);
        assert!((p.data[1] - 1.01).abs() < 1e-6);
    }

    #[test]
    fn minimizes_a_quadratic() {
        // f(x) = (x - 3)^2
        let mut adam = Adam::new(0.1, 0.9, 0.999, 1e-7);
        let mut x = Matrix::from_rows(vec![vec![0.0]]);
        for _ in 0..1000 {
            adam.begin_step();
            let grad = Matrix::from_rows(vec![vec![2.0 * (x.data[0] - 3.0)]]);
            adam.update(0, &mut x, &grad);
        }
        assert!((x.data[0] - 3.0).abs() < 0.05, "x = {}", x.data[0]);
    }

    #[test]
    fn slots_keep_independent_state() {
        let mut adam = Adam::new(0.1, 0.9, 0.999, 1e-7);
        let mut a = Matrix::zeros(1, 1);
        let mut b = Matrix::zeros(1, 3);
        adam.begin_step();
        adam.update(0, &mut a, &Matrix::from_rows(vec![vec![1.0]]));
        adam.update(1, &mut b, &Matrix::from_rows(vec![vec![-1.0, 0.0, 1.0]]));
        assert!(a.data[0] < 0.0);
        assert!(b.data[0] > 0.0 && b.data[1] == 0.0 && b.data[2] < 0.0);
    }
}
