//! Turns a classified payload into something the page can display.

use serde::Serialize;

use super::fallback;
use super::normalize::normalize;
use super::service::{LabelService, RemoteImage};
use super::sniff::{classify, latin1_text, ContentKind};
use super::zpl;
use crate::error::ToolkitError;
use crate::images;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderPath {
    /// Bytes embedded as-is (PDF and images).
    Direct,
    /// Rendered by the remote label service.
    Service,
    /// Drawn locally after the service could not be used.
    LocalFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewArtifact {
    pub kind: ContentKind,
    pub path: RenderPath,
    pub image_url: String,
    pub mime: String,
    pub byte_len: usize,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PreviewOutcome {
    Ready(PreviewArtifact),
    Failed { message: String },
}

impl PreviewOutcome {
    pub fn artifact(&self) -> Option<&PreviewArtifact> {
        match self {
            Self::Ready(artifact) => Some(artifact),
            Self::Failed { .. } => None,
        }
    }
}

fn direct(kind: ContentKind, mime: &str, bytes: &[u8]) -> PreviewArtifact {
    let status = match (kind, images::probe_dimensions(bytes)) {
        (ContentKind::PngImage | ContentKind::JpegImage, Some((width, height))) => {
            format!("{} detected ({width}×{height}), shown directly", kind.label())
        }
        _ => format!("{} detected, shown directly", kind.label()),
    };
    PreviewArtifact {
        kind,
        path: RenderPath::Direct,
        image_url: images::data_url(mime, bytes),
        mime: mime.to_string(),
        byte_len: bytes.len(),
        status,
    }
}

fn from_service(kind: ContentKind, byte_len: usize, image: RemoteImage) -> PreviewArtifact {
    PreviewArtifact {
        kind,
        path: RenderPath::Service,
        image_url: image.url,
        mime: image.mime,
        byte_len,
        status: format!("{} generated via label service", kind.label()),
    }
}

/// Converts a failed (or skipped) service call into a locally drawn placeholder.
pub fn recover_locally(
    kind: ContentKind,
    byte_len: usize,
    zpl: &str,
    failure: Option<&ToolkitError>,
) -> PreviewArtifact {
    let local = fallback::render_local(zpl);
    let status = match failure {
        Some(err) => format!(
            "label service failed ({}), showing local placeholder",
            err.reason()
        ),
        None => "nothing to send to the label service, showing local placeholder".to_string(),
    };
    PreviewArtifact {
        kind,
        path: RenderPath::LocalFallback,
        image_url: local.image_url,
        mime: "image/png".to_string(),
        byte_len,
        status,
    }
}

/// Pipeline position of a preview run, reported to observers as it advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "path", rename_all = "camelCase")]
pub enum RunStage {
    Idle,
    Decoding,
    Classifying,
    Rendering(RenderPath),
    Done,
}

async fn render_remote<S, F>(
    service: &S,
    kind: ContentKind,
    byte_len: usize,
    zpl: String,
    observe: &mut F,
) -> PreviewArtifact
where
    S: LabelService,
    F: FnMut(RunStage),
{
    observe(RunStage::Rendering(RenderPath::Service));
    log::debug!("sending {} characters of ZPL to the label service", zpl.len());
    match service.render_zpl(&zpl).await {
        Ok(image) => from_service(kind, byte_len, image),
        Err(err) => {
            log::warn!("{err}; falling back to local rendering");
            observe(RunStage::Rendering(RenderPath::LocalFallback));
            recover_locally(kind, byte_len, &zpl, Some(&err))
        }
    }
}

async fn render_observed<S, F>(
    service: &S,
    bytes: &[u8],
    kind: ContentKind,
    observe: &mut F,
) -> PreviewArtifact
where
    S: LabelService,
    F: FnMut(RunStage),
{
    let byte_len = bytes.len();
    match kind {
        ContentKind::Pdf | ContentKind::PngImage | ContentKind::JpegImage => {
            observe(RunStage::Rendering(RenderPath::Direct));
            let mime = kind.embed_mime().unwrap_or("application/octet-stream");
            direct(kind, mime, bytes)
        }
        ContentKind::ZplText => {
            render_remote(service, kind, byte_len, latin1_text(bytes), observe).await
        }
        ContentKind::Text => {
            let zpl = zpl::wrap_text(&latin1_text(bytes));
            render_remote(service, kind, byte_len, zpl, observe).await
        }
        ContentKind::BinaryData if bytes.is_empty() => {
            observe(RunStage::Rendering(RenderPath::LocalFallback));
            recover_locally(kind, 0, "", None)
        }
        ContentKind::BinaryData => {
            let zpl = zpl::describe_payload(kind, byte_len);
            render_remote(service, kind, byte_len, zpl, observe).await
        }
    }
}

/// Renders decoded bytes according to their kind. Never fails.
pub async fn render<S: LabelService>(
    service: &S,
    bytes: &[u8],
    kind: ContentKind,
) -> PreviewArtifact {
    render_observed(service, bytes, kind, &mut |_: RunStage| {}).await
}

/// Decodes, classifies and renders one pasted payload, reporting each stage to `observe`.
pub async fn run_pipeline<S, F>(service: &S, raw: &str, mut observe: F) -> PreviewOutcome
where
    S: LabelService,
    F: FnMut(RunStage),
{
    observe(RunStage::Decoding);
    let bytes = match normalize(raw) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::debug!("preview rejected: {err}");
            observe(RunStage::Done);
            return PreviewOutcome::Failed {
                message: err.to_string(),
            };
        }
    };
    observe(RunStage::Classifying);
    let kind = classify(&bytes);
    log::debug!("classified {} bytes as {}", bytes.len(), kind.label());
    let artifact = render_observed(service, &bytes, kind, &mut observe).await;
    observe(RunStage::Done);
    PreviewOutcome::Ready(artifact)
}

pub async fn preview_payload<S: LabelService>(service: &S, raw: &str) -> PreviewOutcome {
    run_pipeline(service, raw, |_: RunStage| {}).await
}
