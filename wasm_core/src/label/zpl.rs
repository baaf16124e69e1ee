//! ZPL helpers: synthesising minimal labels and pulling field data back out.

use std::sync::OnceLock;

use regex::Regex;

use super::sniff::ContentKind;

static FIELD_DATA: OnceLock<Regex> = OnceLock::new();

fn field_data_pattern() -> &'static Regex {
    FIELD_DATA.get_or_init(|| Regex::new(r"\^FD([^\^]*)").expect("static field data pattern"))
}

/// Removes ZPL command prefixes and collapses whitespace so text fits in one `^FD` field.
pub fn sanitize_field(text: &str) -> String {
    text.split(|ch: char| ch.is_whitespace() || ch == '^' || ch == '~')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

const FIELD_LEFT: u32 = 50;
const FIRST_FIELD_Y: u32 = 50;
const FIELD_SPACING: u32 = 40;

/// Wraps plain text into a label with one field per non-blank input line.
pub fn wrap_text(text: &str) -> String {
    let mut lines: Vec<String> = text
        .lines()
        .map(sanitize_field)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    let mut zpl = String::from("^XA^CF0,30");
    for (idx, line) in lines.iter().enumerate() {
        let y = FIRST_FIELD_Y + FIELD_SPACING * idx as u32;
        zpl.push_str(&format!("^FO{FIELD_LEFT},{y}^FD{line}^FS"));
    }
    zpl.push_str("^XZ");
    zpl
}

/// Diagnostic label for payloads that cannot be rendered faithfully.
pub fn describe_payload(kind: ContentKind, byte_len: usize) -> String {
    format!(
        "^XA^CF0,40^FO50,50^FD{}^FS^CF0,30^FO50,110^FD{} bytes^FS^XZ",
        kind.label(),
        byte_len
    )
}

/// Every `^FD` segment up to the next caret, trimmed; empty segments are dropped.
pub fn extract_field_data(zpl: &str) -> Vec<String> {
    field_data_pattern()
        .captures_iter(zpl)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|field| !field.is_empty())
        .collect()
}

/// Keeps printable ASCII only, used when a payload carries no field data at all.
pub fn printable_excerpt(payload: &str, max_chars: usize) -> String {
    payload
        .chars()
        .filter(|ch| matches!(ch, '\x20'..='\x7e'))
        .take(max_chars)
        .collect::<String>()
        .trim()
        .to_string()
}
