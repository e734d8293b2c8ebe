//! Readers for the IDX binary format used by MNIST and its derivatives
//! (Fashion-MNIST, EMNIST, ...).
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a class index
//! ```

pub const IMAGE_MAGIC: u32 = 0x0000_0803;
pub const LABEL_MAGIC: u32 = 0x0000_0801;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdxError {
    #[error("file too short: expected at least {expected} header bytes, got {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    #[error("magic number mismatch: expected {expected:#010x}, got {actual:#010x}")]
    BadMagic { expected: u32, actual: u32 },

    #[error("header declares {declared} data bytes but only {available} follow the header")]
    TruncatedData { declared: usize, available: usize },

    #[error("dimensions overflow: {0}")]
    Overflow(String),
}

/// Raw uint8 images from an IDX3 file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxImages {
    pub count: usize,
    pub rows: usize,
    pub cols: usize,
    /// `count * rows * cols` bytes, image after image, row-major.
    pub pixels: Vec<u8>,
}

fn be_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn check_header(bytes: &[u8], header_len: usize, magic: u32) -> Result<(), IdxError> {
    if bytes.len() < header_len {
        return Err(IdxError::TruncatedHeader { expected: header_len, actual: bytes.len() });
    }
    let actual = be_u32(bytes, 0);
    if actual != magic {
        return Err(IdxError::BadMagic { expected: magic, actual });
    }
    Ok(())
}

/// Parses an IDX3 image file.
pub fn parse_images(bytes: &[u8]) -> Result<IdxImages, IdxError> {
    check_header(bytes, 16, IMAGE_MAGIC)?;

    let count = be_u32(bytes, 4) as usize;
    let rows = be_u32(bytes, 8) as usize;
    let cols = be_u32(bytes, 12) as usize;

    let declared = rows
        .checked_mul(cols)
        .and_then(|n_pixels| n_pixels.checked_mul(count))
        .ok_or_else(|| IdxError::Overflow(format!("{} x {} x {}", count, rows, cols)))?;

    let available = bytes.len() - 16;
    if available < declared {
        return Err(IdxError::TruncatedData { declared, available });
    }

    Ok(IdxImages {
        count,
        rows,
        cols,
        pixels: bytes[16..16 + declared].to_vec(),
    })
}

/// Parses an IDX1 label file.
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>, IdxError> {
    check_header(bytes, 8, LABEL_MAGIC)?;

    let declared = be_u32(bytes, 4) as usize;
    let available = bytes.len() - 8;
    if available < declared {
        return Err(IdxError::TruncatedData { declared, available });
    }
    Ok(bytes[8..8 + declared].to_vec())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn image_file(count: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
        out.extend_from_slice(&count.to_be_bytes());
        out.extend_from_slice(&rows.to_be_bytes());
        out.extend_from_slice(&cols.to_be_bytes());
        out.extend_from_slice(pixels);
        out
    }

    pub(crate) fn label_file(labels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
        out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        out.extend_from_slice(labels);
        out
    }

    #[test]
    fn parses_images() {
        let bytes = image_file(2, 2, 3, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 255]);
        let images = parse_images(&bytes).unwrap();
        assert_eq!((images.count, images.rows, images.cols), (2, 2, 3));
        assert_eq!(images.pixels.len(), 12);
        assert_eq!(images.pixels[11], 255);
    }

    #[test]
    fn parses_labels() {
        assert_eq!(parse_labels(&label_file(&[9, 0, 3])).unwrap(), vec![9, 0, 3]);
    }

    #[test]
    fn rejects_label_file_as_images() {
        let err = parse_images(&label_file(&[1; 16])).unwrap_err();
        assert_eq!(err, IdxError::BadMagic { expected: IMAGE_MAGIC, actual: LABEL_MAGIC });
    }

    #[test]
    fn rejects_short_header_and_short_data() {
        assert!(matches!(parse_images(&[0, 0, 8]), Err(IdxError::TruncatedHeader { .. })));
        let bytes = image_file(3, 2, 2, &[0; 8]);
        assert_eq!(
            parse_images(&bytes).unwrap_err(),
            IdxError::TruncatedData { declared: 12, available: 8 }
        );
        let mut labels = label_file(&[1, 2, 3]);
        labels.pop();
        assert!(matches!(parse_labels(&labels), Err(IdxError::TruncatedData { .. })));
    }

    #[test]
    fn ignores_trailing_bytes() {
        let mut bytes = image_file(1, 1, 2, &[7, 8]);
        bytes.extend_from_slice(&[1, 2, 3]);
        assert_eq!(parse_images(&bytes).unwrap().pixels, vec![7, 8]);
    }
}
