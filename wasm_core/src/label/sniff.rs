//! Content sniffing for decoded label payloads.
//!
//! Magic numbers are checked first because they are exact; plain text versus
//! binary needs ratio thresholds since pasted text often carries stray noise.

use serde::Serialize;

const PDF_SIGNATURE: &[u8] = b"%PDF";
// A corrupted header may push the signature a few bytes in.
const PDF_SEARCH_WINDOW: usize = 10;
const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
const ZPL_MARKERS: [&str; 4] = ["^XA", "^FO", "^FD", "^FS"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContentKind {
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "png")]
    PngImage,
    #[serde(rename = "jpeg")]
    JpegImage,
    #[serde(rename = "zpl")]
    ZplText,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "binary")]
    BinaryData,
}

impl ContentKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::PngImage => "PNG image",
            Self::JpegImage => "JPEG image",
            Self::ZplText => "ZPL label",
            Self::Text => "Text",
            Self::BinaryData => "Binary data",
        }
    }

    /// MIME type used when the bytes are embedded without rendering.
    pub fn embed_mime(self) -> Option<&'static str> {
        match self {
            Self::Pdf => Some("application/pdf"),
            Self::PngImage => Some("image/png"),
            Self::JpegImage => Some("image/jpeg"),
            Self::ZplText | Self::Text | Self::BinaryData => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PngImage => "png",
            Self::JpegImage => "jpg",
            Self::ZplText => "zpl",
            Self::Text => "txt",
            Self::BinaryData => "bin",
        }
    }
}

/// Decodes bytes one-to-one into chars (ISO-8859-1), the way `atob` output is read.
pub fn latin1_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Classifies a decoded payload. Total: anything unrecognised is [`ContentKind::BinaryData`].
pub fn classify(bytes: &[u8]) -> ContentKind {
    if is_pdf(bytes) {
        return ContentKind::Pdf;
    }
    if bytes.starts_with(&PNG_MAGIC) {
        return ContentKind::PngImage;
    }
    if bytes.starts_with(&JPEG_MAGIC) {
        return ContentKind::JpegImage;
    }
    let text = latin1_text(bytes);
    if ZPL_MARKERS.iter().any(|marker| text.contains(marker)) {
        return ContentKind::ZplText;
    }
    if looks_like_text(&text) {
        ContentKind::Text
    } else {
        ContentKind::BinaryData
    }
}

fn is_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(PDF_SEARCH_WINDOW)];
    head.windows(PDF_SIGNATURE.len())
        .any(|window| window == PDF_SIGNATURE)
}

fn is_printable_or_space(ch: char) -> bool {
    matches!(ch, '\x20'..='\x7e' | '\t' | '\r' | '\n')
}

fn is_control(ch: char) -> bool {
    matches!(ch, '\x00'..='\x1f' | '\x7f')
}

fn is_binary_indicator(ch: char) -> bool {
    matches!(ch, '\x00'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f' | '\x7f'..='\u{ff}')
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRatios {
    pub readability: f64,
    pub binary: f64,
}

/// Fractions of readable and binary-looking characters; both are 0 for empty text.
pub fn text_ratios(text: &str) -> TextRatios {
    let total = text.chars().count();
    if total == 0 {
        return TextRatios {
            readability: 0.0,
            binary: 0.0,
        };
    }
    let readable = text.chars().filter(|ch| !is_control(*ch)).count();
    let binary = text.chars().filter(|ch| is_binary_indicator(*ch)).count();
    TextRatios {
        readability: readable as f64 / total as f64,
        binary: binary as f64 / total as f64,
    }
}

fn looks_like_text(text: &str) -> bool {
    if !text.chars().all(is_printable_or_space) {
        return false;
    }
    let ratios = text_ratios(text);
    (ratios.readability > 0.9 && ratios.binary < 0.05)
        || (ratios.readability > 0.8 && ratios.binary < 0.10)
}
