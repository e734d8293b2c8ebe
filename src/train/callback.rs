use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::error::Result;
use crate::summary::SummaryWriter;
use crate::train::epoch_stats::{EpochStats, History};
use crate::train::train_config::TrainConfig;

/// Hooks into `Model::fit`. Every hook defaults to a no-op; an error from
/// any hook aborts training and is returned from `fit`.
pub trait TrainCallback {
    fn on_train_begin(&mut self, _config: &TrainConfig, _steps_per_epoch: usize) -> Result<()> {
        Ok(())
    }

    fn on_epoch_begin(&mut self, _epoch: usize, _total_epochs: usize) -> Result<()> {
        Ok(())
    }

    /// `loss` and `accuracy` are running means over the epoch so far.
    fn on_batch_end(&mut self, _batch: usize, _loss: f64, _accuracy: f64) -> Result<()> {
        Ok(())
    }

    fn on_epoch_end(&mut self, _stats: &EpochStats) -> Result<()> {
        Ok(())
    }

    fn on_train_end(&mut self, _history: &History) -> Result<()> {
        Ok(())
    }
}

/// Writes `epoch_loss` and `epoch_accuracy` scalars at step `epoch - 1`.
pub struct SummaryCallback {
    writer: SummaryWriter,
}

impl SummaryCallback {
    pub fn new(writer: SummaryWriter) -> Self {
        SummaryCallback { writer }
    }

    /// Opens a writer in `<log_dir>/train`.
    pub fn for_log_dir(log_dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = log_dir.into().join("train");
        Ok(SummaryCallback::new(SummaryWriter::create(dir)?))
    }
}

impl TrainCallback for SummaryCallback {
    fn on_epoch_end(&mut self, stats: &EpochStats) -> Result<()> {
        let step = stats.epoch.saturating_sub(1) as u64;
        self.writer.scalar("epoch_loss", step, stats.loss)?;
        self.writer.scalar("epoch_accuracy", step, stats.accuracy)
    }
}

/// One progress bar per epoch with the running loss and accuracy.
pub struct ProgressCallback {
    hidden: bool,
    steps: usize,
    bar: Option<ProgressBar>,
}

impl ProgressCallback {
    pub fn new() -> Self {
        ProgressCallback { hidden: false, steps: 0, bar: None }
    }

    /// Same bookkeeping, nothing drawn; for tests and non-interactive runs.
    pub fn hidden() -> Self {
        ProgressCallback { hidden: true, steps: 0, bar: None }
    }
}

impl Default for ProgressCallback {
    fn default() -> Self {
        ProgressCallback::new()
    }
}

impl TrainCallback for ProgressCallback {
    fn on_train_begin(&mut self, _config: &TrainConfig, steps_per_epoch: usize) -> Result<()> {
        self.steps = steps_per_epoch;
        Ok(())
    }

    fn on_epoch_begin(&mut self, epoch: usize, total_epochs: usize) -> Result<()> {
        let bar = if self.hidden {
            let bar = ProgressBar::hidden();
            bar.set_length(self.steps as u64);
            bar
        } else {
            ProgressBar::new(self.steps as u64)
        };
        let style = ProgressStyle::with_template("{prefix} {pos:>5}/{len:5} [{bar:30}] {elapsed} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.set_prefix(format!("Epoch {}/{}", epoch, total_epochs));
        self.bar = Some(bar);
        Ok(())
    }

    fn on_batch_end(&mut self, _batch: usize, loss: f64, accuracy: f64) -> Result<()> {
        if let Some(bar) = &self.bar {
            bar.inc(1);
            bar.set_message(format!("loss: {:.4} - accuracy: {:.4}", loss, accuracy));
        }
        Ok(())
    }

    fn on_epoch_end(&mut self, stats: &EpochStats) -> Result<()> {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(format!(
                "loss: {:.4} - accuracy: {:.4}",
                stats.loss, stats.accuracy
            ));
        }
        info!(
            epoch = stats.epoch,
            loss = stats.loss,
            accuracy = stats.accuracy,
            elapsed_ms = stats.elapsed_ms,
            "epoch finished"
        );
        Ok(())
    }
}
