pub mod activation;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod metrics;
pub mod network;
pub mod optim;
pub mod plot;
pub mod summary;
pub mod train;
pub mod viewer;
pub mod walkthrough;

// Convenience re-exports
pub use activation::ActivationFunction;
pub use config::RunConfig;
pub use data::Dataset;
pub use error::{Error, Result};
pub use layers::Layer;
pub use loss::SparseCategoricalCrossentropy;
pub use math::Matrix;
pub use network::{Network, NetworkSpec};
pub use optim::{Adam, OptimizerConfig, Sgd};
pub use summary::SummaryWriter;
pub use train::{Model, TrainConfig};
