#![cfg(target_arch = "wasm32")]

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64_STD;
use js_sys::Reflect;
use serde_json::Value as JsonValue;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use opskit_core::error::ToolkitError;
use opskit_core::label::{GlooLabelService, LabelService};
use opskit_core::{
    classify_base64_payload, clear_label_preview, copy_text_request, default_settings,
    generate_carrier_routes, normalize_base64_payload, preview_in_flight, preview_label,
    preview_stage, render_label_locally, rewrite_insert_range_jump, save_preview_request,
    save_settings, save_text_request, split_number_range,
};

// Nothing listens on the discard port, so every request fails in transport.
const UNREACHABLE_SERVICE: &str = "http://127.0.0.1:9/";

wasm_bindgen_test_configure!(run_in_browser);

fn js_to_json(value: JsValue) -> JsonValue {
    serde_wasm_bindgen::from_value(value).expect("JsValue -> JSON")
}

fn field<'a>(map: &'a JsonValue, key: &str) -> &'a str {
    map.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("missing string field {key}"))
}

#[wasm_bindgen_test]
fn normalize_decodes_pasted_payload() {
    let bytes = normalize_base64_payload(" JVBE\nRi0x LjQ= ").expect("decode");
    assert_eq!(bytes, b"%PDF-1.4");
    assert!(normalize_base64_payload("A").is_err());
}

#[wasm_bindgen_test]
fn classify_reports_kind_and_length() {
    let png = B64_STD.encode([0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]);
    let summary = js_to_json(classify_base64_payload(&png).expect("classify"));
    assert_eq!(field(&summary, "kind"), "png");
    assert_eq!(field(&summary, "label"), "PNG image");
    assert_eq!(summary["byteLength"], 10);
}

#[wasm_bindgen_test]
fn local_render_is_a_png_data_url() {
    let url = render_label_locally("^XA^FO50,50^FDDOCK 4^FS^XZ");
    assert!(url.starts_with("data:image/png;base64,"));
}

#[wasm_bindgen_test]
fn split_range_returns_plain_objects() {
    let segments = js_to_json(split_number_range("1", "10", "30, 70").expect("split"));
    let segments = segments.as_array().expect("array");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0]["end"], 3);
    assert_eq!(segments[1]["start"], 4);
    assert_eq!(segments[1]["count"], 7);
    let err = split_number_range("5", "1", "100").unwrap_err();
    assert!(err.as_string().unwrap_or_default().contains("start must be less"));
}

#[wasm_bindgen_test]
fn range_jump_returns_update_text() {
    let sql = "INSERT INTO r (id, lo) VALUES (3, 40);";
    let out = rewrite_insert_range_jump(sql, "id", "", "2").expect("rewrite");
    assert_eq!(out, "UPDATE r SET lo = 42 WHERE id = 3;");
}

#[wasm_bindgen_test]
fn settings_defaults_are_plain_objects() {
    let settings = js_to_json(default_settings().expect("settings"));
    assert_eq!(field(&settings, "theme"), "light");
    assert_eq!(settings["toolVisibility"]["labelPreview"], true);
    assert_eq!(settings["toolOrder"][0], "rangeSplit");
}

#[wasm_bindgen_test]
fn export_requests_carry_action_tags() {
    let copy = js_to_json(copy_text_request("UPDATE r SET lo = 1;").expect("copy"));
    assert_eq!(field(&copy, "action"), "copy");
    let save = js_to_json(save_text_request("jump.sql", "x").expect("save"));
    assert_eq!(field(&save, "action"), "save");
    assert_eq!(field(&save, "fileName"), "jump.sql");
}

#[wasm_bindgen_test]
fn idle_session_has_nothing_to_save() {
    clear_label_preview();
    assert!(!preview_in_flight());
    let stage = js_to_json(preview_stage().expect("stage"));
    assert_eq!(field(&stage, "stage"), "idle");
    assert!(save_preview_request().is_err());
}

#[wasm_bindgen_test]
async fn unreachable_label_service_reports_remote_render_error() {
    let service = GlooLabelService::new(UNREACHABLE_SERVICE);
    let result = service.render_zpl("^XA^FDDOCK 4^FS^XZ").await;
    assert!(matches!(result, Err(ToolkitError::RemoteRender(_))));
}

#[wasm_bindgen_test]
async fn preview_falls_back_locally_when_service_is_unreachable() {
    let settings = default_settings().expect("settings");
    Reflect::set(
        &settings,
        &JsValue::from_str("labelServiceUrl"),
        &JsValue::from_str(UNREACHABLE_SERVICE),
    )
    .expect("set url");
    save_settings(settings).expect("store settings");

    let payload = B64_STD.encode("^XA^FO50,50^FDSHIP TO^FS^XZ");
    let outcome = js_to_json(preview_label(payload).await.expect("preview"));
    assert_eq!(field(&outcome, "state"), "ready");
    assert_eq!(field(&outcome, "kind"), "zpl");
    assert_eq!(field(&outcome, "path"), "localFallback");
    assert!(field(&outcome, "imageUrl").starts_with("data:image/png;base64,"));
    assert!(field(&outcome, "status").contains("label service failed"));
    assert!(!preview_in_flight());

    let saved = js_to_json(save_preview_request().expect("save request"));
    assert_eq!(field(&saved, "fileName"), "label.png");

    clear_label_preview();
    save_settings(default_settings().expect("settings")).expect("restore settings");
}

#[wasm_bindgen_test]
fn carrier_routes_accept_partial_options() {
    let options = js_sys::Object::new();
    Reflect::set(&options, &JsValue::from_str("firstPriority"), &JsValue::from_f64(7.0))
        .expect("set priority");
    let out = generate_carrier_routes("ups", "ORD, LAX", options.into()).expect("routes");
    assert!(out.ends_with("VALUES ('UPS', 'ORD', 'LAX', 'STANDARD', 7, 1);"));
    assert!(generate_carrier_routes("ups", "", JsValue::NULL).is_err());
}
