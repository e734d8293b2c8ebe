use crate::data::idx::IdxImages;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Labelled grayscale images kept as raw bytes until normalization.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub rows: usize,
    pub cols: usize,
    pixels: Vec<u8>,
    labels: Vec<u8>,
}

impl Dataset {
    /// Pairs parsed images with their labels. Counts must agree and every
    /// label must be below `n_classes`.
    pub fn new(images: IdxImages, labels: Vec<u8>, n_classes: usize) -> Result<Dataset> {
        if images.count != labels.len() {
            return Err(Error::Shape(format!(
                "image file declares {} items but label file declares {}",
                images.count, labels.len()
            )));
        }
        if let Some((i, &bad)) = labels.iter().enumerate().find(|(_, &l)| l as usize >= n_classes) {
            return Err(Error::Shape(format!(
                "label at index {} is class {}, out of range for {} classes",
                i, bad, n_classes
            )));
        }
        Ok(Dataset {
            rows: images.rows,
            cols: images.cols,
            pixels: images.pixels,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn pixels_per_image(&self) -> usize {
        self.rows * self.cols
    }

    /// Shape of one sample as `(height, width, channels)`.
    pub fn sample_shape(&self) -> [usize; 3] {
        [self.rows, self.cols, 1]
    }

    /// Raw bytes of image `i`, row-major.
    pub fn image(&self, i: usize) -> &[u8] {
        let n = self.pixels_per_image();
        &self.pixels[i * n..(i + 1) * n]
    }

    pub fn label(&self, i: usize) -> usize {
        self.labels[i] as usize
    }

    pub fn labels(&self) -> Vec<usize> {
        self.labels.iter().map(|&l| l as usize).collect()
    }

    /// First `n` samples (or all of them if there are fewer).
    pub fn take(&self, n: usize) -> Dataset {
        let n = n.min(self.len());
        Dataset {
            rows: self.rows,
            cols: self.cols,
            pixels: self.pixels[..n * self.pixels_per_image()].to_vec(),
            labels: self.labels[..n].to_vec(),
        }
    }

    /// One flattened sample per row, pixels scaled from `[0, 255]` to `[0, 1]`.
    pub fn normalized(&self) -> Matrix {
        let data = self.pixels.iter().map(|&p| p as f64 / 255.0).collect();
        Matrix::from_vec(self.len(), self.pixels_per_image(), data)
    }
}
