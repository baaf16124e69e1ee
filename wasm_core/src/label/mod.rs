//! Label payload previewer: Base64 cleanup, content sniffing and rendering.
//!
//! Data flows one way: pasted text → [`normalize`] → [`classify`] →
//! [`render`] → a [`PreviewArtifact`] the page can display. Only decoding can
//! fail; a failed service call is replaced by a [`fallback`] rendering.

pub mod fallback;
pub mod normalize;
pub mod preview;
pub mod service;
pub mod session;
pub mod sniff;
pub mod zpl;

pub use fallback::{render_local, LocalLabel};
pub use normalize::normalize;
pub use preview::{
    preview_payload, render, run_pipeline, PreviewArtifact, PreviewOutcome, RenderPath, RunStage,
};
pub use service::{check_response, LabelService, RemoteImage, DEFAULT_LABEL_SERVICE_URL};
pub use session::{Completion, PreviewSession, RunTicket};
pub use sniff::{classify, ContentKind};

#[cfg(target_arch = "wasm32")]
pub use service::GlooLabelService;
