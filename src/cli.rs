//! Command-line surface: `fashion-nn [train] [OPTIONS]` and
//! `fashion-nn serve [OPTIONS]`.
//!
//! Every option can also come from a `FASHION_NN_<NAME>` environment
//! variable; a flag wins over the environment, which wins over the
//! `--config` file, which wins over the defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::RunConfig;
use crate::error::Result;

/// Train a dense network on Fashion-MNIST and log summaries.
#[derive(Parser, Debug)]
#[command(name = "fashion-nn", version, about, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Options for the default `train` command.
    #[command(flatten)]
    pub train: TrainArgs,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the walkthrough (the default)
    Train(TrainArgs),
    /// Browse a log directory in the browser
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct TrainArgs {
    /// JSON file with any RunConfig fields
    #[arg(long, env = "FASHION_NN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the four IDX files
    #[arg(long, env = "FASHION_NN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Where summaries are written
    #[arg(long, env = "FASHION_NN_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, env = "FASHION_NN_EPOCHS")]
    pub epochs: Option<usize>,

    #[arg(long, env = "FASHION_NN_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    #[arg(long, env = "FASHION_NN_HIDDEN_UNITS")]
    pub hidden_units: Option<usize>,

    #[arg(long, env = "FASHION_NN_LEARNING_RATE")]
    pub learning_rate: Option<f64>,

    /// Linear output layer, softmax inside the loss
    #[arg(long, env = "FASHION_NN_FROM_LOGITS")]
    pub from_logits: bool,

    /// Fix weight init and shuffling
    #[arg(long, env = "FASHION_NN_SEED")]
    pub seed: Option<u64>,

    /// Write the trained network as JSON
    #[arg(long, env = "FASHION_NN_SAVE_MODEL")]
    pub save_model: Option<PathBuf>,

    /// Train on the first N samples only
    #[arg(long, env = "FASHION_NN_TRAIN_LIMIT")]
    pub train_limit: Option<usize>,

    /// Evaluate on the first N samples only
    #[arg(long, env = "FASHION_NN_TEST_LIMIT")]
    pub test_limit: Option<usize>,
}

#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct ServeArgs {
    /// JSON file with any RunConfig fields
    #[arg(long, env = "FASHION_NN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log directory to browse
    #[arg(long, env = "FASHION_NN_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "FASHION_NN_VIEWER_ADDR")]
    pub addr: Option<String>,
}

/// What `main` should do, with its settings fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Train(RunConfig),
    Serve(RunConfig),
}

fn base_config(file: Option<&PathBuf>) -> Result<RunConfig> {
    match file {
        Some(path) => RunConfig::from_file(path),
        None => Ok(RunConfig::default()),
    }
}

impl TrainArgs {
    /// Layers these options over the config file (or the defaults).
    pub fn resolve(self) -> Result<RunConfig> {
        let mut c = base_config(self.config.as_ref())?;
        if let Some(v) = self.data_dir {
            c.data_dir = v;
        }
        if let Some(v) = self.log_dir {
            c.log_dir = v;
        }
        if let Some(v) = self.epochs {
            c.epochs = v;
        }
        if let Some(v) = self.batch_size {
            c.batch_size = v;
        }
        if let Some(v) = self.hidden_units {
            c.hidden_units = v;
        }
        if let Some(v) = self.learning_rate {
            c.learning_rate = v;
        }
        c.from_logits |= self.from_logits;
        if self.seed.is_some() {
            c.seed = self.seed;
        }
        if self.save_model.is_some() {
            c.save_model = self.save_model;
        }
        if self.train_limit.is_some() {
            c.train_limit = self.train_limit;
        }
        if self.test_limit.is_some() {
            c.test_limit = self.test_limit;
        }
        c.validate()?;
        Ok(c)
    }
}

impl ServeArgs {
    pub fn resolve(self) -> Result<RunConfig> {
        let mut c = base_config(self.config.as_ref())?;
        if let Some(v) = self.log_dir {
            c.log_dir = v;
        }
        if let Some(v) = self.addr {
            c.viewer_addr = v;
        }
        Ok(c)
    }
}

impl Cli {
    pub fn into_command(self) -> Result<Command> {
        Ok(match self.command {
            Some(CliCommand::Serve(args)) => Command::Serve(args.resolve()?),
            Some(CliCommand::Train(args)) => Command::Train(args.resolve()?),
            None => Command::Train(self.train.resolve()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn command(args: &[&str]) -> Command {
        let argv = std::iter::once("fashion-nn").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().into_command().unwrap()
    }

    fn train(args: &[&str]) -> RunConfig {
        match command(args) {
            Command::Train(c) => c,
            other => panic!("expected train, got {:?}", other),
        }
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_means_train_with_defaults() {
        let c = train(&[]);
        let d = RunConfig::default();
        assert_eq!((c.epochs, c.batch_size, c.hidden_units), (d.epochs, d.batch_size, d.hidden_units));
        assert_eq!(c.data_dir, d.data_dir);
        assert_eq!(c.log_dir, d.log_dir);
    }

    #[test]
    fn flags_work_with_and_without_the_subcommand() {
        let c = train(&["train", "--epochs", "2", "--seed=5", "--from-logits"]);
        assert_eq!(c.epochs, 2);
        assert_eq!(c.seed, Some(5));
        assert!(c.from_logits);

        let c = train(&["--batch-size", "64", "--learning-rate", "0.01"]);
        assert_eq!(c.batch_size, 64);
        assert_eq!(c.learning_rate, 0.01);
    }

    #[test]
    fn serve_subcommand() {
        match command(&["serve", "--log-dir", "runs", "--addr", "0.0.0.0:9000"]) {
            Command::Serve(c) => {
                assert_eq!(c.log_dir, PathBuf::from("runs"));
                assert_eq!(c.viewer_addr, "0.0.0.0:9000");
            }
            other => panic!("expected serve, got {:?}", other),
        }
    }

    #[test]
    fn environment_fills_unset_flags() {
        // Only this test touches FASHION_NN_TEST_LIMIT.
        std::env::set_var("FASHION_NN_TEST_LIMIT", "7");
        let from_env = train(&[]);
        let from_flag = train(&["--test-limit", "3"]);
        std::env::remove_var("FASHION_NN_TEST_LIMIT");
        assert_eq!(from_env.test_limit, Some(7));
        assert_eq!(from_flag.test_limit, Some(3));
    }

    #[test]
    fn config_file_sits_under_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(&path, r#"{"epochs": 4, "batch_size": 64}"#).unwrap();
        let path = path.to_str().unwrap();
        let c = train(&["--config", path, "--batch-size", "16"]);
        assert_eq!(c.epochs, 4);
        assert_eq!(c.batch_size, 16);
    }

    #[test]
    fn usage_and_value_errors() {
        let parse = |args: &[&str]| Cli::try_parse_from(std::iter::once("fashion-nn").chain(args.iter().copied()));
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--epochs"]).is_err());
        assert!(parse(&["stray"]).is_err());
        assert!(parse(&["--epochs", "x"]).is_err());
        assert!(parse(&["serve", "--epochs", "3"]).is_err());

        let err = parse(&["--batch-size", "0"]).unwrap().into_command().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
