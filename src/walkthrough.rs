//! The end-to-end tutorial run: load, normalize, log sample grids, build
//! and summarize the model, train, evaluate, and log prediction figures.

use tracing::{info, warn};

use crate::config::RunConfig;
use crate::data::{fashion, Dataset, CLASS_NAMES};
use crate::error::{Error, Result};
use crate::network::{ModelMetadata, NetworkSpec};
use crate::optim::OptimizerConfig;
use crate::plot;
use crate::summary::SummaryWriter;
use crate::train::{Evaluation, History, Model, ProgressCallback, SummaryCallback, TrainCallback, TrainConfig};

/// Sample grids are 5x5.
const GRID_SIDE: u32 = 5;
/// Test images that get their own `samples` figure.
const SAMPLE_FIGURES: usize = 10;
const PREDICTION_ROWS: u32 = 5;
const PREDICTION_COLS: u32 = 3;

/// Everything a run produced, for callers that want more than stdout.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub history: History,
    pub evaluation: Evaluation,
    /// Printed model summary.
    pub summary: String,
}

/// How chatty the run is on the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Progress bars plus the summary and evaluation lines.
    Interactive,
    /// Nothing on stdout; logging only.
    Quiet,
}

fn limited(ds: Dataset, limit: Option<usize>) -> Dataset {
    match limit {
        Some(n) if n < ds.len() => ds.take(n),
        _ => ds,
    }
}

/// Runs the whole walkthrough as configured.
pub fn run(config: &RunConfig, verbosity: Verbosity) -> Result<Outcome> {
    config.validate()?;

    // 1. Load and normalize.
    let (train, test) = fashion::load(&config.data_dir)?;
    let train = limited(train, config.train_limit);
    let test = limited(test, config.test_limit);
    if test.is_empty() {
        return Err(Error::Config("the test split is empty".to_owned()));
    }
    if (train.rows, train.cols) != (test.rows, test.cols) {
        return Err(Error::Shape(format!(
            "train images are {}x{} but test images are {}x{}",
            train.rows, train.cols, test.rows, test.cols
        )));
    }
    let [height, width, channels] = train.sample_shape();
    info!(train = train.len(), test = test.len(), height, width, channels, "datasets ready");

    let train_x = train.normalized();
    let test_x = test.normalized();
    let train_y = train.labels();
    let test_y = test.labels();

    // 2. Sample grids.
    std::fs::create_dir_all(&config.log_dir).map_err(|e| Error::io(&config.log_dir, e))?;
    config.save_json(&config.log_dir.join("config.json"))?;
    let mut writer = SummaryWriter::create(&config.log_dir)?;
    writer.image("training_set", 0, &plot::image_grid(&train, GRID_SIDE, GRID_SIDE))?;
    writer.image("test_set", 0, &plot::image_grid(&test, GRID_SIDE, GRID_SIDE))?;

    // 3. Model.
    let mut spec = NetworkSpec::fashion_mnist(config.hidden_units, config.from_logits);
    spec.input_shape = vec![train.rows, train.cols];
    spec.optimizer = OptimizerConfig::adam(config.learning_rate);
    spec.metadata = Some(ModelMetadata {
        description: Some("Fashion-MNIST dense classifier".to_owned()),
        output_labels: Some(CLASS_NAMES.iter().map(|s| s.to_string()).collect()),
    });
    let mut model = Model::from_spec(&spec, config.seed)?;
    let optimizer = model.optimizer_config();
    info!(
        optimizer = optimizer.name(),
        learning_rate = optimizer.learning_rate(),
        from_logits = model.loss().from_logits,
        params = model.network().param_count(),
        "model compiled"
    );

    let summary = model.network().summary().to_string();
    if verbosity == Verbosity::Interactive {
        println!("{}", summary);
    }

    // 4. Train.
    let train_config = TrainConfig::new(config.epochs, config.batch_size);
    let progress = match verbosity {
        Verbosity::Interactive => ProgressCallback::new(),
        Verbosity::Quiet => ProgressCallback::hidden(),
    };
    let mut callbacks: Vec<Box<dyn TrainCallback>> = vec![
        Box::new(SummaryCallback::for_log_dir(&config.log_dir)?),
        Box::new(progress),
    ];
    let history = model.fit(&train_x, &train_y, &train_config, &mut callbacks)?;
    if let Some(last) = history.last() {
        info!(epochs = history.epochs.len(), loss = last.loss, accuracy = last.accuracy, "training finished");
    }

    // 5. Evaluate.
    let evaluation = model.evaluate(&test_x, &test_y, config.batch_size)?;
    if verbosity == Verbosity::Interactive {
        println!("{}", evaluation);
    }
    info!(loss = evaluation.loss, accuracy = evaluation.accuracy, "test evaluation");

    // 6. Prediction figures.
    let predictions = model.predict(&test_x, config.batch_size)?;
    for i in 0..SAMPLE_FIGURES.min(test.len()) {
        let panel = plot::prediction_panel(&test, i, predictions.row(i));
        writer.image("samples", i as u64, &panel)?;
    }
    if test.len() < (PREDICTION_ROWS * PREDICTION_COLS) as usize {
        warn!(test = test.len(), "fewer test images than prediction grid cells");
    }
    let grid = plot::prediction_grid(&test, &predictions, PREDICTION_ROWS, PREDICTION_COLS);
    writer.image("samples_15", 0, &grid)?;

    if let Some(path) = &config.save_model {
        model.network().save_json(path)?;
        info!("model saved to {}", path.display());
    }

    Ok(Outcome { history, evaluation, summary })
}
