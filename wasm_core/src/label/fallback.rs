//! Offline label rendering used when the label service is unavailable.
//!
//! The pixel layout is fixed (a 4×6 inch label at 203 dpi) so previews stay
//! comparable across runs; only the drawn text depends on the payload.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

use super::zpl;
use crate::images;

pub const CANVAS_WIDTH: u32 = 812;
pub const CANVAS_HEIGHT: u32 = 1218;
pub const BORDER_INSET: u32 = 10;
pub const BORDER_WIDTH: u32 = 2;
pub const TEXT_LEFT: u32 = 50;
pub const FIRST_LINE_Y: u32 = 100;
pub const LINE_SPACING: u32 = 40;
pub const MAX_LINES: usize = 8;
pub const MAX_LINE_CHARS: usize = 40;
pub const FOOTER_Y: u32 = CANVAS_HEIGHT - 60;
pub const PLACEHOLDER_TEXT: &str = "ZPL Label Preview";

const EXCERPT_CHARS: usize = 100;
const GLYPH_SIZE: u32 = 8;
const TEXT_SCALE: u32 = 2;
const PLACEHOLDER_SCALE: u32 = 3;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const GREY: Rgba<u8> = Rgba([102, 102, 102, 255]);

/// What ended up on the canvas, kept alongside the image for callers and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLayout {
    /// Lines drawn top to bottom, already truncated. Empty when the placeholder was drawn.
    pub lines: Vec<String>,
    pub footer: String,
}

impl LabelLayout {
    pub fn is_placeholder(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalLabel {
    pub image_url: String,
    pub layout: LabelLayout,
}

fn truncate_line(line: &str) -> String {
    if line.chars().count() <= MAX_LINE_CHARS {
        return line.to_string();
    }
    let mut out: String = line.chars().take(MAX_LINE_CHARS - 3).collect();
    out.push_str("...");
    out
}

/// Works out which lines a payload produces without drawing anything.
pub fn layout_label(payload: &str) -> LabelLayout {
    let mut fields = zpl::extract_field_data(payload);
    if fields.is_empty() {
        let excerpt = zpl::printable_excerpt(payload, EXCERPT_CHARS);
        if !excerpt.is_empty() {
            fields.push(excerpt);
        }
    }
    LabelLayout {
        lines: fields
            .iter()
            .take(MAX_LINES)
            .map(|field| truncate_line(field))
            .collect(),
        footer: format!("ZPL length: {} characters", payload.chars().count()),
    }
}

/// Draws the payload onto a fresh label canvas.
pub fn draw_label(layout: &LabelLayout) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, WHITE);
    stroke_border(&mut canvas);
    if layout.is_placeholder() {
        let width = text_width(PLACEHOLDER_TEXT, PLACEHOLDER_SCALE);
        let x = CANVAS_WIDTH.saturating_sub(width) / 2;
        let y = (CANVAS_HEIGHT - GLYPH_SIZE * PLACEHOLDER_SCALE) / 2;
        draw_text(&mut canvas, x, y, PLACEHOLDER_TEXT, PLACEHOLDER_SCALE, BLACK);
    } else {
        for (idx, line) in layout.lines.iter().enumerate() {
            let y = FIRST_LINE_Y + LINE_SPACING * idx as u32;
            draw_text(&mut canvas, TEXT_LEFT, y, line, TEXT_SCALE, BLACK);
        }
    }
    draw_text(&mut canvas, TEXT_LEFT, FOOTER_Y, &layout.footer, TEXT_SCALE, GREY);
    canvas
}

/// Renders a ZPL (or arbitrary) payload locally. Always returns an image.
pub fn render_local(payload: &str) -> LocalLabel {
    let layout = layout_label(payload);
    let canvas = draw_label(&layout);
    LocalLabel {
        image_url: images::png_data_url(&canvas),
        layout,
    }
}

fn stroke_border(canvas: &mut RgbaImage) {
    let left = BORDER_INSET;
    let top = BORDER_INSET;
    let right = CANVAS_WIDTH - BORDER_INSET;
    let bottom = CANVAS_HEIGHT - BORDER_INSET;
    fill_rect(canvas, left, top, right - left, BORDER_WIDTH, BLACK);
    fill_rect(canvas, left, bottom - BORDER_WIDTH, right - left, BORDER_WIDTH, BLACK);
    fill_rect(canvas, left, top, BORDER_WIDTH, bottom - top, BLACK);
    fill_rect(canvas, right - BORDER_WIDTH, top, BORDER_WIDTH, bottom - top, BLACK);
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let x_end = (x + width).min(canvas.width());
    let y_end = (y + height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

fn draw_text(canvas: &mut RgbaImage, x: u32, y: u32, text: &str, scale: u32, color: Rgba<u8>) {
    let mut cursor = x;
    for ch in text.chars() {
        if cursor >= canvas.width() {
            break;
        }
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // Bit 0 is the leftmost pixel of the row.
                if bits & (1 << col) != 0 {
                    fill_rect(
                        canvas,
                        cursor + col * scale,
                        y + row as u32 * scale,
                        scale,
                        scale,
                        color,
                    );
                }
            }
        }
        cursor += GLYPH_SIZE * scale;
    }
}
