//! Error taxonomy shared by every toolkit operation.
//!
//! Only [`ToolkitError::Decode`] ends a label preview run; remote rendering
//! failures are folded into a local placeholder before they reach the page.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolkitError {
    /// Pasted text could not be turned into Base64 bytes.
    #[error("invalid Base64 payload: {0}")]
    Decode(String),
    /// The label rendering service did not return a usable image.
    #[error("label service failed: {0}")]
    RemoteRender(String),
    /// Pasted SQL could not be parsed into INSERT rows.
    #[error("could not parse SQL: {0}")]
    Parse(String),
    #[error("invalid range: {0}")]
    InvalidRange(String),
    /// Carrier route input could not be turned into INSERT rows.
    #[error("invalid carrier route: {0}")]
    InvalidRoute(String),
    #[error("settings error: {0}")]
    Settings(String),
}

impl ToolkitError {
    /// Short reason without the category prefix, used inside status lines.
    pub fn reason(&self) -> &str {
        match self {
            Self::Decode(msg)
            | Self::RemoteRender(msg)
            | Self::Parse(msg)
            | Self::InvalidRange(msg)
            | Self::InvalidRoute(msg)
            | Self::Settings(msg) => msg,
        }
    }
}

pub type ToolkitResult<T> = Result<T, ToolkitError>;
