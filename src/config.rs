use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Settings for one walkthrough run.
///
/// Resolved in layers: defaults, then an optional JSON file, then
/// `FASHION_NN_*` environment variables and command-line flags (see
/// `cli`). Unknown keys in the JSON file are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub epochs: usize,
    pub batch_size: usize,
    pub hidden_units: usize,
    pub learning_rate: f64,
    /// Keep the output layer linear and let the loss apply the softmax.
    pub from_logits: bool,
    pub seed: Option<u64>,
    /// Where to write the trained network as JSON, if anywhere.
    pub save_model: Option<PathBuf>,
    pub viewer_addr: String,
    /// Use only the first N training samples.
    pub train_limit: Option<usize>,
    /// Use only the first N test samples.
    pub test_limit: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            data_dir: PathBuf::from("data/fashion_mnist"),
            log_dir: PathBuf::from("logs/nn_fashion_mnist/"),
            epochs: 10,
            batch_size: 32,
            hidden_units: 128,
            learning_rate: 0.001,
            from_logits: false,
            seed: None,
            save_model: None,
            viewer_addr: "127.0.0.1:6006".to_owned(),
            train_limit: None,
            test_limit: None,
        }
    }
}

impl RunConfig {
    /// Loads a JSON config file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<RunConfig> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_owned()));
        }
        if self.hidden_units == 0 {
            return Err(Error::Config("hidden_units must be at least 1".to_owned()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::Config(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if self.train_limit == Some(0) {
            return Err(Error::Config("train_limit must be at least 1".to_owned()));
        }
        Ok(())
    }

    /// Writes the resolved config as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| Error::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_tutorial() {
        let c = RunConfig::default();
        assert_eq!(c.epochs, 10);
        assert_eq!(c.batch_size, 32);
        assert_eq!(c.hidden_units, 128);
        assert_eq!(c.log_dir, PathBuf::from("logs/nn_fashion_mnist/"));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn file_layer_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{ "epochs": 2, "save_model": "m.json" }"#).unwrap();
        let c = RunConfig::from_file(&path).unwrap();
        assert_eq!(c.epochs, 2);
        assert_eq!(c.save_model, Some(PathBuf::from("m.json")));
        assert_eq!(c.batch_size, 32);
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut c = RunConfig::default();
        c.batch_size = 0;
        assert!(c.validate().is_err());
        let mut c = RunConfig::default();
        c.learning_rate = -1.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn misspelled_file_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{ "epoch": 3 }"#).unwrap();
        let err = RunConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Json(_)), "{:?}", err);
        assert!(err.to_string().contains("epoch"), "{}", err);
    }
}
