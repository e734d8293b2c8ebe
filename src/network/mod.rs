pub mod metadata;
pub mod network;
pub mod spec;
pub mod summary;

pub use metadata::ModelMetadata;
pub use network::Network;
pub use spec::{NetworkSpec, LayerSpec};
pub use summary::Summary;
