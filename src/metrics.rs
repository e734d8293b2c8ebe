use crate::math::matrix::Matrix;

/// Number of rows whose argmax equals the integer label.
pub fn correct_predictions(outputs: &Matrix, labels: &[usize]) -> usize {
    outputs.argmax_rows().iter()
        .zip(labels)
        .filter(|(predicted, label)| predicted == label)
        .count()
}

/// Fraction of rows whose argmax equals the integer label; 0 for no rows.
pub fn sparse_categorical_accuracy(outputs: &Matrix, labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    correct_predictions(outputs, labels) as f64 / labels.len() as f64
}

/// Sample-weighted running mean, used for per-epoch loss and accuracy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean {
    total: f64,
    count: usize,
}

impl Mean {
    pub fn update(&mut self, value: f64, weight: usize) {
        self.total += value * weight as f64;
        self.count += weight;
    }

    pub fn result(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.total / self.count as f64 }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_counts_argmax_hits() {
        let out = Matrix::from_rows(vec![
            vec![0.1, 0.9],
            vec![0.8, 0.2],
            vec![0.3, 0.7],
        ]);
        assert_eq!(correct_predictions(&out, &[1, 1, 1]), 2);
        assert!((sparse_categorical_accuracy(&out, &[1, 0, 1]) - 1.0).abs() < 1e-12);
        assert_eq!(sparse_categorical_accuracy(&Matrix::zeros(0, 2), &[]), 0.0);
    }

    #[test]
    fn mean_weights_by_batch_size() {
        let mut m = Mean::default();
        m.update(1.0, 3);
        m.update(0.0, 1);
        assert!((m.result() - 0.75).abs() < 1e-12);
        assert_eq!(m.count(), 4);
    }
}
