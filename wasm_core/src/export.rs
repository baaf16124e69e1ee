//! Copy/save requests handed to the page.
//!
//! The core never touches the clipboard or the filesystem; it only describes
//! what should be copied or downloaded and lets the page carry it out.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::images;
use crate::label::PreviewArtifact;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ExportRequest {
    Copy {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Save {
        file_name: String,
        mime: String,
        data_base64: String,
    },
    #[serde(rename_all = "camelCase")]
    SaveUrl { file_name: String, url: String },
}

pub fn copy_text(text: &str) -> ExportRequest {
    ExportRequest::Copy {
        text: text.to_string(),
    }
}

pub fn save_text(file_name: &str, text: &str) -> ExportRequest {
    ExportRequest::Save {
        file_name: download_name(file_name, "txt"),
        mime: "text/plain;charset=utf-8".to_string(),
        data_base64: STANDARD.encode(text.as_bytes()),
    }
}

/// Save request for the preview currently shown.
pub fn save_preview(artifact: &PreviewArtifact) -> ExportRequest {
    let ext = match artifact.mime.as_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => artifact.kind.extension(),
    };
    let file_name = format!("label.{ext}");
    match images::parse_data_url(&artifact.image_url) {
        Some((mime, bytes)) => ExportRequest::Save {
            file_name,
            mime,
            data_base64: STANDARD.encode(bytes),
        },
        None => ExportRequest::SaveUrl {
            file_name,
            url: artifact.image_url.clone(),
        },
    }
}

// Characters Windows refuses in file names, plus both path separators.
fn is_reserved_in_file_name(ch: char) -> bool {
    ch.is_control() || matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

/// Keeps the stem of a user-supplied name, strips directories and forces `ext`
/// when the name has no extension of its own.
pub fn download_name(original: &str, default_ext: &str) -> String {
    let path = Path::new(original.trim());
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("export");
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(default_ext);
    let safe = |part: &str| -> String {
        part.chars()
            .map(|ch| if is_reserved_in_file_name(ch) { '_' } else { ch })
            .collect()
    };
    format!("{}.{}", safe(stem), safe(ext))
}
