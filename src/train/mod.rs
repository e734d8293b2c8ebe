pub mod callback;
pub mod epoch_stats;
pub mod loop_fn;
pub mod model;
pub mod train_config;

pub use callback::{ProgressCallback, SummaryCallback, TrainCallback};
pub use epoch_stats::{EpochStats, Evaluation, History};
pub use model::Model;
pub use train_config::TrainConfig;
