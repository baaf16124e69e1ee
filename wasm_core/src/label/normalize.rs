//! Turns arbitrary pasted text into Base64 bytes.
//!
//! Label payloads arrive from spreadsheets, XML dumps and chat windows, so the
//! cleaner is deliberately forgiving: it throws away anything that is not part
//! of the alphabet and repairs the padding before decoding.

use std::sync::OnceLock;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;

use crate::error::{ToolkitError, ToolkitResult};

// Mirrors `atob`: trailing bits in the final quantum are tolerated.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static IMAGE_MARKER: OnceLock<Regex> = OnceLock::new();

// Some upstream exports splice `</Image>` or `/Image/` into the payload.
fn image_marker() -> &'static Regex {
    IMAGE_MARKER.get_or_init(|| Regex::new(r"</Image>?|/Image/").expect("static marker pattern"))
}

fn is_base64_symbol(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '+' | '/' | '=' | '-' | '_')
}

/// Runs the cleaning steps and returns the padded Base64 text that will be decoded.
pub fn clean_base64(raw: &str) -> String {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    let unmarked = image_marker().replace_all(&compact, "");
    let mut cleaned: String = unmarked
        .chars()
        .filter(|ch| is_base64_symbol(*ch))
        .map(|ch| match ch {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let trimmed_len = cleaned.trim_end_matches('=').len();
    cleaned.truncate(trimmed_len);
    let rem = cleaned.len() % 4;
    if rem != 0 {
        cleaned.extend(std::iter::repeat_n('=', 4 - rem));
    }
    cleaned
}

/// Cleans `raw` and decodes it. Input without any Base64 content yields an empty vector.
pub fn normalize(raw: &str) -> ToolkitResult<Vec<u8>> {
    let cleaned = clean_base64(raw);
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }
    LENIENT
        .decode(cleaned.as_bytes())
        .map_err(|err| ToolkitError::Decode(err.to_string()))
}
