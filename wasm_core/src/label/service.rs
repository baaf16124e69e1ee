//! Seam for the remote label rendering service.

use crate::error::{ToolkitError, ToolkitResult};

pub const DEFAULT_LABEL_SERVICE_URL: &str =
    "https://api.labelary.com/v1/printers/8dpmm/labels/4x6/0/";

/// A successfully rendered label, already exposed through a URL the page can display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    pub url: String,
    pub mime: String,
    pub byte_len: usize,
}

/// Renders ZPL into an image. Every failure mode is reported as
/// [`ToolkitError::RemoteRender`]; callers never retry.
#[allow(async_fn_in_trait)]
pub trait LabelService {
    async fn render_zpl(&self, zpl: &str) -> ToolkitResult<RemoteImage>;
}

/// Accepts a service reply only when it is a 2xx carrying an `image/*` body.
pub fn check_response(ok: bool, status: u16, status_text: &str, mime: &str) -> ToolkitResult<()> {
    if !ok {
        return Err(ToolkitError::RemoteRender(
            format!("HTTP {status} {status_text}").trim_end().to_string(),
        ));
    }
    let essence = mime.split(';').next().unwrap_or_default().trim();
    if !essence.to_ascii_lowercase().starts_with("image/") {
        return Err(ToolkitError::RemoteRender(format!(
            "expected an image response, got '{mime}'"
        )));
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub use browser::GlooLabelService;

#[cfg(target_arch = "wasm32")]
mod browser {
    use gloo_net::http::Request;
    use wasm_bindgen::JsValue;
    use web_sys::{Blob, BlobPropertyBag, Url};

    use super::{check_response, LabelService, RemoteImage};
    use crate::error::{ToolkitError, ToolkitResult};

    /// POSTs raw ZPL to a Labelary-compatible endpoint from the browser.
    #[derive(Debug, Clone)]
    pub struct GlooLabelService {
        endpoint: String,
    }

    impl GlooLabelService {
        pub fn new(endpoint: impl Into<String>) -> Self {
            Self {
                endpoint: endpoint.into(),
            }
        }
    }

    fn remote_err(err: impl std::fmt::Display) -> ToolkitError {
        ToolkitError::RemoteRender(err.to_string())
    }

    fn js_err(err: JsValue) -> ToolkitError {
        ToolkitError::RemoteRender(
            err.as_string()
                .unwrap_or_else(|| "browser rejected the image blob".to_string()),
        )
    }

    fn object_url(bytes: &[u8], mime: &str) -> ToolkitResult<String> {
        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(mime);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_err)?;
        Url::create_object_url_with_blob(&blob).map_err(js_err)
    }

    impl LabelService for GlooLabelService {
        async fn render_zpl(&self, zpl: &str) -> ToolkitResult<RemoteImage> {
            let response = Request::post(&self.endpoint)
                .header("Accept", "image/png")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(zpl)
                .map_err(remote_err)?
                .send()
                .await
                .map_err(remote_err)?;
            let mime = response
                .headers()
                .get("content-type")
                .unwrap_or_default();
            check_response(
                response.ok(),
                response.status(),
                &response.status_text(),
                &mime,
            )?;
            let bytes = response.binary().await.map_err(remote_err)?;
            let url = object_url(&bytes, &mime)?;
            Ok(RemoteImage {
                url,
                mime,
                byte_len: bytes.len(),
            })
        }
    }
}
