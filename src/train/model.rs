use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::loss::SparseCategoricalCrossentropy;
use crate::math::matrix::Matrix;
use crate::metrics::{self, Mean};
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::optim::{Optimizer, OptimizerConfig};
use crate::train::callback::TrainCallback;
use crate::train::epoch_stats::{Evaluation, History};
use crate::train::loop_fn::EpochRunner;
use crate::train::train_config::TrainConfig;

/// A network compiled with a loss and an optimizer.
pub struct Model {
    network: Network,
    loss: SparseCategoricalCrossentropy,
    optimizer_config: OptimizerConfig,
    optimizer: Box<dyn Optimizer>,
    rng: StdRng,
}

impl Model {
    /// Pairs `network` with its loss and optimizer.
    ///
    /// Fails if the output layer does not match the loss (see
    /// `SparseCategoricalCrossentropy::check_output_activation`). `seed`
    /// fixes the per-epoch shuffle order.
    pub fn compile(
        network: Network,
        optimizer: OptimizerConfig,
        loss: SparseCategoricalCrossentropy,
        seed: Option<u64>,
    ) -> Result<Model> {
        let activation = network.output_activation().ok_or_else(|| {
            Error::Config("network has no dense output layer to train".to_owned())
        })?;
        loss.check_output_activation(activation)?;

        debug!(optimizer = optimizer.name(), from_logits = loss.from_logits, "model compiled");
        Ok(Model {
            network,
            loss,
            optimizer: optimizer.build(),
            optimizer_config: optimizer,
            rng: match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        })
    }

    /// Builds fresh weights from `spec` and compiles them with the spec's
    /// loss and optimizer.
    pub fn from_spec(spec: &NetworkSpec, seed: Option<u64>) -> Result<Model> {
        let mut init_rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let network = spec.build(&mut init_rng)?;
        Model::compile(network, spec.optimizer, spec.loss, seed.map(|s| s.wrapping_add(1)))
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn loss(&self) -> SparseCategoricalCrossentropy {
        self.loss
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        self.optimizer_config
    }

    /// Trains on `(inputs, labels)` for `config.epochs` epochs.
    pub fn fit(
        &mut self,
        inputs: &Matrix,
        labels: &[usize],
        config: &TrainConfig,
        callbacks: &mut [Box<dyn TrainCallback>],
    ) -> Result<History> {
        config.validate()?;
        check_inputs(inputs, labels)?;
        if inputs.rows == 0 {
            return Err(Error::Config("cannot fit on an empty training set".to_owned()));
        }

        let steps = config.steps_per_epoch(inputs.rows);
        for cb in callbacks.iter_mut() {
            cb.on_train_begin(config, steps)?;
        }

        let mut history = History::default();
        let mut runner = EpochRunner {
            network: &mut self.network,
            optimizer: self.optimizer.as_mut(),
            loss: self.loss,
            config,
        };
        for epoch in 1..=config.epochs {
            for cb in callbacks.iter_mut() {
                cb.on_epoch_begin(epoch, config.epochs)?;
            }
            let stats = runner.run(epoch, inputs, labels, &mut self.rng, callbacks)?;
            if !stats.loss.is_finite() {
                warn!(epoch, "training loss is not finite");
            }
            for cb in callbacks.iter_mut() {
                cb.on_epoch_end(&stats)?;
            }
            history.epochs.push(stats);
        }

        for cb in callbacks.iter_mut() {
            cb.on_train_end(&history)?;
        }
        Ok(history)
    }

    /// Mean loss and accuracy over `(inputs, labels)`; no weights change.
    pub fn evaluate(&self, inputs: &Matrix, labels: &[usize], batch_size: usize) -> Result<Evaluation> {
        check_inputs(inputs, labels)?;
        let batch_size = batch_size.max(1);
        let mut loss_mean = Mean::default();
        let mut correct = 0usize;
        let mut batches = 0usize;

        for start in (0..inputs.rows).step_by(batch_size) {
            let end = (start + batch_size).min(inputs.rows);
            let indices: Vec<usize> = (start..end).collect();
            let output = self.network.predict(&inputs.select_rows(&indices))?;
            let y = &labels[start..end];
            loss_mean.update(self.loss.loss(&output, y)?, y.len());
            correct += metrics::correct_predictions(&output, y);
            batches += 1;
        }

        let accuracy = if inputs.rows == 0 { 0.0 } else { correct as f64 / inputs.rows as f64 };
        Ok(Evaluation { loss: loss_mean.result(), accuracy, batches })
    }

    /// Class probabilities, one row per input sample.
    pub fn predict(&self, inputs: &Matrix, batch_size: usize) -> Result<Matrix> {
        let batch_size = batch_size.max(1);
        let mut data = Vec::with_capacity(inputs.rows * self.network.output_size());
        for start in (0..inputs.rows).step_by(batch_size) {
            let end = (start + batch_size).min(inputs.rows);
            let indices: Vec<usize> = (start..end).collect();
            let output = self.network.predict(&inputs.select_rows(&indices))?;
            data.extend(self.loss.probabilities(&output).data);
        }
        Ok(Matrix::from_vec(inputs.rows, self.network.output_size(), data))
    }
}

fn check_inputs(inputs: &Matrix, labels: &[usize]) -> Result<()> {
    if inputs.rows != labels.len() {
        return Err(Error::Shape(format!(
            "{} input samples but {} labels",
            inputs.rows, labels.len()
        )));
    }
    Ok(())
}
