//! Image helpers shared by the label previewer and its unit tests.
//!
//! Previews are handed to the page as `data:` URLs so they can be dropped
//! straight into an `<img>` or `<embed>` without another round trip.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};

// 1×1 white PNG, used only if the encoder itself refuses a canvas.
const BLANK_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAAC0lEQVR4nGP4DwQACfsD/fteaysAAAAASUVORK5CYII=";

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Splits a `data:<mime>;base64,<payload>` URL back into its MIME type and bytes.
pub fn parse_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.as_bytes()).ok()?;
    Some((mime.to_string(), bytes))
}

pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buffer),
        CompressionType::Fast,
        FilterType::Adaptive,
    );
    let (width, height) = canvas.dimensions();
    encoder
        .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|err| format!("failed to encode PNG: {err}"))?;
    Ok(buffer)
}

/// Encodes a canvas as a PNG data URL. Never fails: an encoder error yields a blank pixel.
pub fn png_data_url(canvas: &RgbaImage) -> String {
    match encode_png(canvas) {
        Ok(bytes) => data_url("image/png", &bytes),
        Err(err) => {
            log::error!("{err}; substituting blank image");
            format!("data:image/png;base64,{BLANK_PNG_BASE64}")
        }
    }
}

/// Reads width and height from an image header without decoding pixels.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
