use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::activation::activation::{softmax_rows, ActivationFunction};
use crate::error::{Error, Result};
use crate::layers::{DenseGradients, Layer};
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::network::summary::Summary;
use crate::optim::Optimizer;

/// A sequential stack of layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: ModelMetadata,
}

impl Network {
    /// Builds a network, checking that every layer accepts the previous
    /// layer's output width.
    pub fn new(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(Error::Config("a network needs at least one layer".to_owned()));
        }
        for pair in layers.windows(2) {
            let produced = pair[0].output_size();
            let expected = match &pair[1] {
                Layer::Dense(d) => d.input_size(),
                Layer::Flatten(f) => f.output_size(),
            };
            if produced != expected {
                return Err(Error::Shape(format!(
                    "{} layer outputs {} values but the next {} layer expects {}",
                    pair[0].kind(), produced, pair[1].kind(), expected
                )));
            }
        }
        Ok(Network { layers, metadata: ModelMetadata::default() })
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Network {
        self.metadata = metadata;
        self
    }

    /// Width of one flattened input sample.
    pub fn input_size(&self) -> usize {
        match self.layers.first() {
            Some(Layer::Flatten(f)) => f.output_size(),
            Some(Layer::Dense(d)) => d.input_size(),
            None => 0,
        }
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Layer::output_size)
    }

    /// Activation of the last dense layer, if any.
    pub fn output_activation(&self) -> Option<ActivationFunction> {
        self.layers.iter().rev().find_map(|layer| match layer {
            Layer::Dense(d) => Some(d.activator),
            Layer::Flatten(_) => None,
        })
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(Layer::param_count).sum()
    }

    /// Training forward pass; every layer caches what backprop needs.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Inference forward pass; the network is not modified.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.infer(&current)?;
        }
        Ok(current)
    }

    /// Class probabilities; a linear (logits) output layer gets a row-wise
    /// softmax, any other output is returned as is.
    pub fn predict_proba(&self, input: &Matrix) -> Result<Matrix> {
        let output = self.predict(input)?;
        Ok(match self.output_activation() {
            Some(ActivationFunction::Identity) => softmax_rows(&output),
            _ => output,
        })
    }

    /// Backward pass from dL/dz of the output layer.
    ///
    /// Returns one entry per layer; parameterless layers get `None`.
    pub fn backward(&self, output_delta: &Matrix) -> Result<Vec<Option<DenseGradients>>> {
        let mut grads: Vec<Option<DenseGradients>> = vec![None; self.layers.len()];
        let mut delta = output_delta.clone();
        for (i, layer) in self.layers.iter().enumerate().rev() {
            if let Layer::Dense(dense) = layer {
                let (layer_grads, input_delta) = dense.backward(&delta)?;
                grads[i] = Some(layer_grads);
                delta = input_delta;
            }
        }
        Ok(grads)
    }

    /// Hands each layer's gradients to the optimizer. Dense layer `i` owns
    /// optimizer slots `2i` (weights) and `2i + 1` (biases).
    pub fn apply_gradients(&mut self, grads: &[Option<DenseGradients>], optimizer: &mut dyn Optimizer) {
        optimizer.begin_step();
        for (i, (layer, grad)) in self.layers.iter_mut().zip(grads).enumerate() {
            if let (Layer::Dense(dense), Some(grad)) = (layer, grad) {
                optimizer.update(2 * i, &mut dense.weights, &grad.weights);
                optimizer.update(2 * i + 1, &mut dense.biases, &grad.biases);
            }
        }
    }

    /// Keras-style architecture table.
    pub fn summary(&self) -> Summary<'_> {
        Summary::new(self)
    }

    /// Serializes the network weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Deserializes a network previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let network: Network = serde_json::from_reader(BufReader::new(file))?;
        Network::new(network.layers).map(|n| n.with_metadata(network.metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{Dense, Flatten};
    use crate::loss::SparseCategoricalCrossentropy;
    use crate::optim::Sgd;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tiny(rng: &mut StdRng) -> Network {
        Network::new(vec![
            Layer::Flatten(Flatten::new(vec![2, 2])),
            Layer::Dense(Dense::new(5, 4, ActivationFunction::ReLU, rng)),
            Layer::Dense(Dense::new(3, 5, ActivationFunction::Softmax, rng)),
        ])
        .unwrap()
    }

    #[test]
    fn predict_proba_applies_softmax_to_logits() {
        let mut rng = StdRng::seed_from_u64(4);
        let net = Network::new(vec![
            Layer::Dense(Dense::new(3, 2, ActivationFunction::Identity, &mut rng)),
        ])
        .unwrap();
        let x = Matrix::from_rows(vec![vec![0.5, -1.0]]);
        let p = net.predict_proba(&x).unwrap();
        assert!((p.row(0).iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(p.argmax_rows(), net.predict(&x).unwrap().argmax_rows());
    }

    #[test]
    fn rejects_mismatched_layer_widths() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = Network::new(vec![
            Layer::Flatten(Flatten::new(vec![28, 28])),
            Layer::Dense(Dense::new(10, 100, ActivationFunction::Softmax, &mut rng)),
        ]);
        assert!(matches!(err, Err(Error::Shape(_))));
    }

    #[test]
    fn predict_matches_forward_and_rows_are_distributions() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut net = tiny(&mut rng);
        let x = Matrix::from_rows(vec![vec![0.1, 0.2, 0.3, 0.4], vec![1.0, 0.0, 0.5, 0.25]]);
        let a = net.forward(&x).unwrap();
        let b = net.predict(&x).unwrap();
        assert_eq!(a, b);
        for row in b.iter_rows() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        assert_eq!(net.param_count(), 4 * 5 + 5 + 5 * 3 + 3);
        assert_eq!(net.output_activation(), Some(ActivationFunction::Softmax));
    }

    #[test]
    fn backprop_gradient_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut net = tiny(&mut rng);
        let loss = SparseCategoricalCrossentropy::new(false);
        let x = Matrix::from_rows(vec![vec![0.9, -0.4, 0.3, 0.7], vec![-0.2, 0.5, 0.1, 0.6]]);
        let labels = [2, 0];

        let out = net.forward(&x).unwrap();
        let grads = net.backward(&loss.gradient(&out, &labels).unwrap()).unwrap();
        let analytic = &grads[1].as_ref().unwrap().weights;

        let h = 1e-6;
        for idx in [0, 7, 19] {
            let eval = |delta: f64| {
                let mut n = net.clone();
                if let Layer::Dense(d) = &mut n.layers[1] {
                    d.weights.data[idx] += delta;
                }
                loss.loss(&n.predict(&x).unwrap(), &labels).unwrap()
            };
            let numeric = (eval(h) - eval(-h)) / (2.0 * h);
            assert!(
                (numeric - analytic.data[idx]).abs() < 1e-5,
                "w[{}]: numeric {} vs analytic {}",
                idx, numeric, analytic.data[idx]
            );
        }
        assert!(grads[0].is_none());
    }

    #[test]
    fn a_few_sgd_steps_reduce_the_loss() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut net = tiny(&mut rng);
        let loss = SparseCategoricalCrossentropy::new(false);
        let mut sgd = Sgd::new(0.5);
        let x = Matrix::from_rows(vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0, 1.0]]);
        let labels = [0, 2];

        let before = loss.loss(&net.predict(&x).unwrap(), &labels).unwrap();
        for _ in 0..20 {
            let out = net.forward(&x).unwrap();
            let grads = net.backward(&loss.gradient(&out, &labels).unwrap()).unwrap();
            net.apply_gradients(&grads, &mut sgd);
        }
        let after = loss.loss(&net.predict(&x).unwrap(), &labels).unwrap();
        assert!(after < before, "loss went from {} to {}", before, after);
    }

    #[test]
    fn json_round_trip_preserves_predictions() {
        let mut rng = StdRng::seed_from_u64(5);
        let net = tiny(&mut rng).with_metadata(ModelMetadata {
            description: Some("tiny".to_owned()),
            output_labels: Some(vec!["a".into(), "b".into(), "c".into()]),
        });
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models/tiny.json");
        net.save_json(&path).unwrap();
        let loaded = Network::load_json(&path).unwrap();

        let x = Matrix::from_rows(vec![vec![0.3, 0.1, 0.4, 0.1]]);
        assert_eq!(net.predict(&x).unwrap(), loaded.predict(&x).unwrap());
        assert_eq!(loaded.metadata.description.as_deref(), Some("tiny"));
    }
}
