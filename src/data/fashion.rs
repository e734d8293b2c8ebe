use std::path::Path;

use tracing::info;

use crate::data::dataset::Dataset;
use crate::data::idx;
use crate::error::{Error, Result};

/// Class names indexed by label byte.
pub const CLASS_NAMES: [&str; 10] = [
    "T-shirt/top",
    "Trouser",
    "Pullover",
    "Dress",
    "Coat",
    "Sandal",
    "Shirt",
    "Sneaker",
    "Bag",
    "Ankle boot",
];

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

/// Name for a label, or `"?"` if it is out of range.
pub fn class_name(label: usize) -> &'static str {
    CLASS_NAMES.get(label).copied().unwrap_or("?")
}

/// Loads one split from an image file and a label file.
pub fn load_split(images_path: &Path, labels_path: &Path) -> Result<Dataset> {
    let image_bytes = std::fs::read(images_path).map_err(|e| Error::io(images_path, e))?;
    let label_bytes = std::fs::read(labels_path).map_err(|e| Error::io(labels_path, e))?;

    let images = idx::parse_images(&image_bytes)
        .map_err(|source| Error::Idx { file: images_path.to_path_buf(), source })?;
    let labels = idx::parse_labels(&label_bytes)
        .map_err(|source| Error::Idx { file: labels_path.to_path_buf(), source })?;

    Dataset::new(images, labels, CLASS_NAMES.len())
}

/// Loads `(train, test)` from a directory holding the four standard,
/// uncompressed Fashion-MNIST files.
pub fn load(dir: &Path) -> Result<(Dataset, Dataset)> {
    let train = load_split(&dir.join(TRAIN_IMAGES), &dir.join(TRAIN_LABELS))?;
    let test = load_split(&dir.join(TEST_IMAGES), &dir.join(TEST_LABELS))?;
    info!(
        train = train.len(),
        test = test.len(),
        rows = train.rows,
        cols = train.cols,
        "loaded Fashion-MNIST from {}",
        dir.display()
    );
    Ok((train, test))
}
