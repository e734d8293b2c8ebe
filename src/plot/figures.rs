//! Figures logged as image summaries: captioned sample grids and
//! prediction panels (image plus class-probability bar chart).

use image::{Rgba, RgbaImage};

use crate::data::{class_name, Dataset};
use crate::math::matrix::{argmax, Matrix};
use crate::plot::canvas::{Canvas, BLACK, BLUE, GRAY, RED};
use crate::plot::font;

/// Screen pixels per source pixel.
const IMAGE_SCALE: u32 = 3;
const PAD: u32 = 8;
const CAPTION_HEIGHT: u32 = font::GLYPH_HEIGHT + 6;
/// Width of one image cell in a sample grid.
const GRID_CELL: u32 = 112;
/// Width reserved for the caption under a prediction image.
const PANEL_IMAGE_WIDTH: u32 = 168;
const CHART_WIDTH: u32 = 160;
const CHART_HEIGHT: u32 = 84;

fn image_side(ds: &Dataset) -> (u32, u32) {
    (ds.cols as u32 * IMAGE_SCALE, ds.rows as u32 * IMAGE_SCALE)
}

/// Grid of the first `rows * cols` images, each captioned with its class.
pub fn image_grid(ds: &Dataset, rows: u32, cols: u32) -> RgbaImage {
    let (img_w, img_h) = image_side(ds);
    let cell_w = GRID_CELL.max(img_w + PAD);
    let cell_h = img_h + CAPTION_HEIGHT + PAD;
    let mut canvas = Canvas::new(cols * cell_w + PAD, rows * cell_h + PAD);

    let count = (rows * cols) as usize;
    for i in 0..count.min(ds.len()) {
        let (r, c) = (i as u32 / cols, i as u32 % cols);
        let x0 = PAD + c * cell_w;
        let y0 = PAD + r * cell_h;
        let img_x = x0 + (cell_w - PAD - img_w) / 2;
        canvas.draw_gray(img_x, y0, ds.image(i), ds.rows, ds.cols, IMAGE_SCALE);
        canvas.stroke_rect(img_x, y0, img_w, img_h, BLACK);
        canvas.draw_text_centered(img_x + img_w / 2, y0 + img_h + 4, class_name(ds.label(i)), 1, BLACK);
    }
    canvas.into_image()
}

/// Caption under a prediction image, and whether the prediction is right.
///
/// Format: `"<predicted> <confidence> % (<true>)"`.
pub fn prediction_caption(probs: &[f64], true_label: usize) -> (String, bool) {
    let predicted = argmax(probs);
    let confidence = probs.get(predicted).copied().unwrap_or(0.0);
    let text = format!(
        "{} {:2.0} % ({})",
        class_name(predicted),
        100.0 * confidence,
        class_name(true_label)
    );
    (text, predicted == true_label)
}

/// Bar color per class: gray, the predicted class red, the true class blue.
/// Blue wins when they coincide.
pub fn bar_colors(probs: &[f64], true_label: usize) -> Vec<Rgba<u8>> {
    let predicted = argmax(probs);
    (0..probs.len())
        .map(|i| {
            if i == true_label {
                BLUE
            } else if i == predicted {
                RED
            } else {
                GRAY
            }
        })
        .collect()
}

fn panel_size(ds: &Dataset) -> (u32, u32) {
    let (img_w, img_h) = image_side(ds);
    let left = PANEL_IMAGE_WIDTH.max(img_w);
    let height = (img_h + CAPTION_HEIGHT).max(CHART_HEIGHT + CAPTION_HEIGHT);
    (left + PAD + CHART_WIDTH, height)
}

/// Draws one (image, bar chart) pair with its top-left corner at `(x, y)`.
fn draw_prediction(canvas: &mut Canvas, x: u32, y: u32, ds: &Dataset, index: usize, probs: &[f64]) {
    let (img_w, img_h) = image_side(ds);
    let left = PANEL_IMAGE_WIDTH.max(img_w);
    let true_label = ds.label(index);

    let img_x = x + (left - img_w) / 2;
    canvas.draw_gray(img_x, y, ds.image(index), ds.rows, ds.cols, IMAGE_SCALE);
    canvas.stroke_rect(img_x, y, img_w, img_h, BLACK);
    let (caption, correct) = prediction_caption(probs, true_label);
    let color = if correct { BLUE } else { RED };
    canvas.draw_text_centered(x + left / 2, y + img_h + 4, &caption, 1, color);

    // Bar chart, y range fixed to [0, 1].
    let chart_x = x + left + PAD;
    let n = probs.len().max(1) as u32;
    let slot = CHART_WIDTH / n;
    let bar_w = (slot * 4 / 5).max(1);
    let baseline = y + CHART_HEIGHT;
    for (i, (&p, color)) in probs.iter().zip(bar_colors(probs, true_label)).enumerate() {
        let h = (p.clamp(0.0, 1.0) * CHART_HEIGHT as f64).round() as u32;
        let bx = chart_x + i as u32 * slot + (slot - bar_w) / 2;
        canvas.fill_rect(bx, baseline - h, bar_w, h, color);
        canvas.draw_text_centered(bx + bar_w / 2, baseline + 4, &i.to_string(), 1, BLACK);
    }
    canvas.fill_rect(chart_x, baseline, slot * n, 1, BLACK);
}

/// Single test image with its predicted-probability chart.
pub fn prediction_panel(ds: &Dataset, index: usize, probs: &[f64]) -> RgbaImage {
    let (w, h) = panel_size(ds);
    let mut canvas = Canvas::new(w + 2 * PAD, h + 2 * PAD);
    draw_prediction(&mut canvas, PAD, PAD, ds, index, probs);
    canvas.into_image()
}

/// `rows x cols` prediction panels for the first test images, row-major.
pub fn prediction_grid(ds: &Dataset, predictions: &Matrix, rows: u32, cols: u32) -> RgbaImage {
    let (w, h) = panel_size(ds);
    let (cell_w, cell_h) = (w + 2 * PAD, h + PAD);
    let mut canvas = Canvas::new(cols * cell_w + PAD, rows * cell_h + PAD);
    let count = ((rows * cols) as usize).min(ds.len()).min(predictions.rows);
    for i in 0..count {
        let (r, c) = (i as u32 / cols, i as u32 % cols);
        draw_prediction(&mut canvas, PAD + c * cell_w, PAD + r * cell_h, ds, i, predictions.row(i));
    }
    canvas.into_image()
}
