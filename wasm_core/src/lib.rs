use console_error_panic_hook::set_once as set_panic_hook;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod carrier_routes;
pub mod error;
pub mod export;
pub mod images;
pub mod label;
#[cfg(target_arch = "wasm32")]
mod logger;
pub mod range;
pub mod settings;
pub mod sql;

use carrier_routes::RouteOptions;
use label::ContentKind;
use range::RangeSegment;
use settings::ToolkitSettings;


#[wasm_bindgen(start)]
pub fn wasm_start() {
    set_panic_hook();
    #[cfg(target_arch = "wasm32")]
    logger::init(if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    // Plain objects rather than JS `Map`s so the page can read fields directly.
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct PayloadSummary {
    kind: ContentKind,
    label: &'static str,
    byte_length: usize,
}

#[wasm_bindgen]
pub fn normalize_base64_payload(input: &str) -> Result<Vec<u8>, JsValue> {
    normalize_base64_payload_internal(input).map_err(|err| JsValue::from_str(&err))
}

fn normalize_base64_payload_internal(input: &str) -> Result<Vec<u8>, String> {
    label::normalize(input).map_err(|err| err.to_string())
}

#[wasm_bindgen]
pub fn classify_base64_payload(input: &str) -> Result<JsValue, JsValue> {
    classify_base64_payload_internal(input)
        .map_err(|err| JsValue::from_str(&err))
        .and_then(|summary| to_js(&summary))
}

fn classify_base64_payload_internal(input: &str) -> Result<PayloadSummary, String> {
    let bytes = normalize_base64_payload_internal(input)?;
    let kind = label::classify(&bytes);
    Ok(PayloadSummary {
        kind,
        label: kind.label(),
        byte_length: bytes.len(),
    })
}

/// Draws the offline placeholder for `zpl` and returns it as a PNG data URL.
#[wasm_bindgen]
pub fn render_label_locally(zpl: &str) -> String {
    label::render_local(zpl).image_url
}

#[wasm_bindgen]
pub fn split_number_range(start: &str, end: &str, percentages: &str) -> Result<JsValue, JsValue> {
    split_number_range_internal(start, end, percentages)
        .map_err(|err| JsValue::from_str(&err))
        .and_then(|segments| to_js(&segments))
}

fn parse_bound(name: &str, value: &str) -> Result<i64, String> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("{name} must be a whole number, got '{}'", value.trim()))
}

fn split_number_range_internal(
    start: &str,
    end: &str,
    percentages: &str,
) -> Result<Vec<RangeSegment>, String> {
    let start = parse_bound("start", start)?;
    let end = parse_bound("end", end)?;
    let percentages = range::parse_percentages(percentages).map_err(|err| err.to_string())?;
    range::split_range(start, end, &percentages).map_err(|err| err.to_string())
}

/// `columns` is a comma separated list; leave it blank to shift every integer column.
#[wasm_bindgen]
pub fn rewrite_insert_range_jump(
    sql: &str,
    key_column: &str,
    columns: &str,
    offset: &str,
) -> Result<String, JsValue> {
    rewrite_insert_range_jump_internal(sql, key_column, columns, offset)
        .map_err(|err| JsValue::from_str(&err))
}

fn rewrite_insert_range_jump_internal(
    sql: &str,
    key_column: &str,
    columns: &str,
    offset: &str,
) -> Result<String, String> {
    let offset = parse_bound("offset", offset)?;
    let columns: Vec<String> = columns
        .split(',')
        .map(str::trim)
        .filter(|col| !col.is_empty())
        .map(str::to_string)
        .collect();
    sql::rewrite_range_jump(sql, key_column, &columns, offset)
        .map(|statements| statements.join("\n"))
        .map_err(|err| err.to_string())
}

/// `options` may be `null`/`undefined` or a partial `{ table, defaultServiceLevel,
/// firstPriority, active }` object; missing fields take their defaults.
#[wasm_bindgen]
pub fn generate_carrier_routes(
    carrier: &str,
    routes: &str,
    options: JsValue,
) -> Result<String, JsValue> {
    let options = if options.is_null() || options.is_undefined() {
        RouteOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|err| JsValue::from_str(&format!("invalid route options: {err}")))?
    };
    generate_carrier_routes_internal(carrier, routes, &options)
        .map_err(|err| JsValue::from_str(&err))
}

fn generate_carrier_routes_internal(
    carrier: &str,
    routes: &str,
    options: &RouteOptions,
) -> Result<String, String> {
    carrier_routes::carrier_route_inserts(carrier, routes, options)
        .map(|statements| statements.join("\n"))
        .map_err(|err| err.to_string())
}

#[wasm_bindgen]
pub fn default_settings() -> Result<JsValue, JsValue> {
    to_js(&ToolkitSettings::default())
}

#[wasm_bindgen]
pub fn copy_text_request(text: &str) -> Result<JsValue, JsValue> {
    to_js(&export::copy_text(text))
}

#[wasm_bindgen]
pub fn save_text_request(file_name: &str, text: &str) -> Result<JsValue, JsValue> {
    to_js(&export::save_text(file_name, text))
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use std::rc::Rc;

    use wasm_bindgen::JsValue;

    use crate::label::{PreviewOutcome, PreviewSession};

    thread_local! {
        static SESSION: Rc<PreviewSession> = Rc::new(PreviewSession::new());
    }

    pub(crate) fn session() -> Rc<PreviewSession> {
        SESSION.with(Rc::clone)
    }

    /// Revokes the object URL behind a preview that is no longer shown.
    pub(crate) fn release(outcome: &PreviewOutcome) {
        let Some(artifact) = outcome.artifact() else {
            return;
        };
        if artifact.image_url.starts_with("blob:") {
            if let Err(err) = web_sys::Url::revoke_object_url(&artifact.image_url) {
                log::warn!("could not revoke {}: {err:?}", artifact.image_url);
            }
        }
    }

    pub(crate) fn settings_error(err: crate::error::ToolkitError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

/// Previews one pasted payload. Resolves to `null` when a newer preview
/// started while this one was waiting on the label service.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn preview_label(input: String) -> Result<JsValue, JsValue> {
    use label::{Completion, GlooLabelService};

    let session = browser::session();
    let service = GlooLabelService::new(settings::storage::load().label_service_url);
    match session.run(&service, &input).await {
        Completion::Applied { outcome, displaced } => {
            if let Some(previous) = displaced {
                browser::release(&previous);
            }
            to_js(&outcome)
        }
        Completion::Stale { outcome } => {
            browser::release(&outcome);
            Ok(JsValue::NULL)
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn preview_in_flight() -> bool {
    browser::session().is_pending()
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn preview_stage() -> Result<JsValue, JsValue> {
    to_js(&browser::session().stage())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn clear_label_preview() {
    if let Some(previous) = browser::session().clear() {
        browser::release(&previous);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn save_preview_request() -> Result<JsValue, JsValue> {
    let current = browser::session().current();
    let artifact = current
        .as_ref()
        .and_then(|outcome| outcome.artifact())
        .ok_or_else(|| JsValue::from_str("no preview to save"))?;
    to_js(&export::save_preview(artifact))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn load_settings() -> Result<JsValue, JsValue> {
    to_js(&settings::storage::load())
}

/// Stores the page's settings object and returns the repaired copy that was saved.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn save_settings(value: JsValue) -> Result<JsValue, JsValue> {
    let settings: ToolkitSettings = serde_wasm_bindgen::from_value(value)
        .map_err(|err| JsValue::from_str(&format!("settings error: {err}")))?;
    let settings = settings.normalized();
    settings::storage::save(&settings).map_err(browser::settings_error)?;
    to_js(&settings)
}
