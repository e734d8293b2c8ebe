pub mod canvas;
pub mod figures;
pub mod font;

pub use canvas::Canvas;
pub use figures::{image_grid, prediction_caption, prediction_grid, prediction_panel};
