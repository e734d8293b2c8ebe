use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::{Dense, Flatten, Layer};
use crate::loss::SparseCategoricalCrossentropy;
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;
use crate::optim::OptimizerConfig;

/// One dense layer in a network specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub units: usize,
    pub activation: ActivationFunction,
}

/// A serializable description of a network architecture plus how it is
/// compiled (loss and optimizer).
///
/// The input is always flattened from `input_shape` first; each `LayerSpec`
/// then adds a dense layer whose input width is the previous layer's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    pub input_shape: Vec<usize>,
    /// Dense layers, input to output.
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub loss: SparseCategoricalCrossentropy,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl NetworkSpec {
    /// `Flatten(28x28) -> Dense(hidden, relu) -> Dense(10, softmax)`.
    ///
    /// With `from_logits` the last layer stays linear and the loss applies
    /// the softmax instead.
    pub fn fashion_mnist(hidden_units: usize, from_logits: bool) -> NetworkSpec {
        let output = if from_logits { ActivationFunction::Identity } else { ActivationFunction::Softmax };
        NetworkSpec {
            name: "nn_fashion_mnist".to_owned(),
            input_shape: vec![28, 28],
            layers: vec![
                LayerSpec { units: hidden_units, activation: ActivationFunction::ReLU },
                LayerSpec { units: 10, activation: output },
            ],
            loss: SparseCategoricalCrossentropy::new(from_logits),
            optimizer: OptimizerConfig::default(),
            metadata: None,
        }
    }

    /// Instantiates fresh weights for this architecture.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        if self.layers.is_empty() {
            return Err(Error::Config(format!("network '{}' has no dense layers", self.name)));
        }
        if let Some(spec) = self.layers.iter().find(|l| l.units == 0) {
            return Err(Error::Config(format!(
                "network '{}' has a {} layer with zero units",
                self.name, spec.activation
            )));
        }

        let flatten = Flatten::new(self.input_shape.clone());
        let mut input_size = flatten.output_size();
        let mut layers = vec![Layer::Flatten(flatten)];
        for spec in &self.layers {
            layers.push(Layer::Dense(Dense::new(spec.units, input_size, spec.activation, rng)));
            input_size = spec.units;
        }

        let network = Network::new(layers)?;
        Ok(match &self.metadata {
            Some(meta) => network.with_metadata(meta.clone()),
            None => network,
        })
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<NetworkSpec> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fashion_preset_builds_expected_widths() {
        let net = NetworkSpec::fashion_mnist(64, false)
            .build(&mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(net.input_size(), 784);
        assert_eq!(net.output_size(), 10);
        assert_eq!(net.layers.len(), 3);
    }

    #[test]
    fn logits_preset_has_linear_output() {
        let spec = NetworkSpec::fashion_mnist(32, true);
        let net = spec.build(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(net.output_activation(), Some(ActivationFunction::Identity));
        assert!(spec.loss.from_logits);
    }

    #[test]
    fn zero_unit_layers_are_rejected() {
        let mut spec = NetworkSpec::fashion_mnist(0, false);
        assert!(matches!(spec.build(&mut StdRng::seed_from_u64(0)), Err(Error::Config(_))));
        spec.layers.clear();
        assert!(spec.build(&mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn spec_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.json");
        NetworkSpec::fashion_mnist(128, false).save_json(&path).unwrap();
        let back = NetworkSpec::load_json(&path).unwrap();
        assert_eq!(back.layers.len(), 2);
        assert_eq!(back.optimizer.name(), "adam");
        assert_eq!(back.input_shape, vec![28, 28]);
    }
}
