use image::{Rgba, RgbaImage};

use crate::plot::font;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Bar color for classes that are neither predicted nor true.
pub const GRAY: Rgba<u8> = Rgba([0x77, 0x77, 0x77, 255]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Drawing surface for figures. All drawing clips to the image bounds.
pub struct Canvas {
    img: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Canvas {
        Canvas { img: RgbaImage::from_pixel(width, height, WHITE) }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.img
    }

    fn put(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if x < self.img.width() && y < self.img.height() {
            self.img.put_pixel(x, y, color);
        }
    }

    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
        let x_end = x.saturating_add(w).min(self.img.width());
        let y_end = y.saturating_add(h).min(self.img.height());
        for yy in y..y_end {
            for xx in x..x_end {
                self.img.put_pixel(xx, yy, color);
            }
        }
    }

    /// One-pixel outline.
    pub fn stroke_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
        if w == 0 || h == 0 {
            return;
        }
        self.fill_rect(x, y, w, 1, color);
        self.fill_rect(x, y + h - 1, w, 1, color);
        self.fill_rect(x, y, 1, h, color);
        self.fill_rect(x + w - 1, y, 1, h, color);
    }

    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, scale: u32, color: Rgba<u8>) {
        for (i, c) in text.chars().enumerate() {
            let glyph = font::glyph(c);
            let gx = x + i as u32 * font::ADVANCE * scale;
            for row in 0..font::GLYPH_HEIGHT {
                for col in 0..font::GLYPH_WIDTH {
                    if font::is_set(glyph, col, row) {
                        self.fill_rect(gx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
        }
    }

    /// Draws `text` horizontally centred on `center_x`.
    pub fn draw_text_centered(&mut self, center_x: u32, y: u32, text: &str, scale: u32, color: Rgba<u8>) {
        let x = center_x.saturating_sub(font::text_width(text, scale) / 2);
        self.draw_text(x, y, text, scale, color);
    }

    /// Blits a grayscale image with the "binary" colormap (0 is white,
    /// 255 is black), each source pixel drawn as a `scale x scale` block.
    pub fn draw_gray(&mut self, x: u32, y: u32, pixels: &[u8], rows: usize, cols: usize, scale: u32) {
        for r in 0..rows {
            for c in 0..cols {
                let v = 255 - pixels[r * cols + c];
                let color = Rgba([v, v, v, 255]);
                self.fill_rect(x + c as u32 * scale, y + r as u32 * scale, scale, scale, color);
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.img.get_pixel(x, y)
    }

    /// Sets a single pixel if it falls inside the canvas.
    pub fn dot(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        self.put(x, y, color);
    }
}
