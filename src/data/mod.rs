pub mod dataset;
pub mod fashion;
pub mod idx;

pub use dataset::Dataset;
pub use fashion::{class_name, CLASS_NAMES};
