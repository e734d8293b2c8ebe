use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::loss::SparseCategoricalCrossentropy;
use crate::math::matrix::Matrix;
use crate::metrics::{self, Mean};
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::callback::TrainCallback;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

/// Borrowed training state for a single epoch.
pub(crate) struct EpochRunner<'a> {
    pub network: &'a mut Network,
    pub optimizer: &'a mut dyn Optimizer,
    pub loss: SparseCategoricalCrossentropy,
    pub config: &'a TrainConfig,
}

impl EpochRunner<'_> {
    /// Runs one full epoch of mini-batch updates and returns its statistics.
    ///
    /// Loss and accuracy are averaged over samples, each batch measured
    /// before its own update.
    pub fn run(
        &mut self,
        epoch: usize,
        inputs: &Matrix,
        labels: &[usize],
        rng: &mut StdRng,
        callbacks: &mut [Box<dyn TrainCallback>],
    ) -> Result<EpochStats> {
        let t_start = Instant::now();
        let n = inputs.rows;

        let mut order: Vec<usize> = (0..n).collect();
        if self.config.shuffle {
            order.shuffle(rng);
        }

        let mut loss_mean = Mean::default();
        let mut acc_mean = Mean::default();

        for (batch, indices) in order.chunks(self.config.batch_size).enumerate() {
            let x = inputs.select_rows(indices);
            let y: Vec<usize> = indices.iter().map(|&i| labels[i]).collect();

            let output = self.network.forward(&x)?;
            let batch_loss = self.loss.loss(&output, &y)?;
            let batch_acc = metrics::sparse_categorical_accuracy(&output, &y);
            loss_mean.update(batch_loss, y.len());
            acc_mean.update(batch_acc, y.len());

            let delta = self.loss.gradient(&output, &y)?;
            let grads = self.network.backward(&delta)?;
            self.network.apply_gradients(&grads, &mut *self.optimizer);

            for cb in callbacks.iter_mut() {
                cb.on_batch_end(batch, loss_mean.result(), acc_mean.result())?;
            }
        }

        Ok(EpochStats {
            epoch,
            total_epochs: self.config.epochs,
            loss: loss_mean.result(),
            accuracy: acc_mean.result(),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        })
    }
}
