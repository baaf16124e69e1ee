//! Toolkit settings persisted as a JSON blob in `localStorage`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ToolkitError, ToolkitResult};
use crate::label::DEFAULT_LABEL_SERVICE_URL;

pub const SETTINGS_KEY: &str = "opsToolkit.settings";

pub const TOOL_RANGE_SPLIT: &str = "rangeSplit";
pub const TOOL_LABEL_PREVIEW: &str = "labelPreview";
pub const TOOL_SQL_RANGE_JUMP: &str = "sqlRangeJump";
pub const TOOL_CARRIER_ROUTES: &str = "carrierRoutes";

pub const KNOWN_TOOLS: [&str; 4] = [
    TOOL_RANGE_SPLIT,
    TOOL_LABEL_PREVIEW,
    TOOL_SQL_RANGE_JUMP,
    TOOL_CARRIER_ROUTES,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    #[serde(rename = "light")]
    Light,
    #[serde(rename = "dark")]
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolkitSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_tool_order")]
    pub tool_order: Vec<String>,
    #[serde(default = "default_tool_visibility")]
    pub tool_visibility: BTreeMap<String, bool>,
    #[serde(default = "default_label_service_url")]
    pub label_service_url: String,
}

fn default_tool_order() -> Vec<String> {
    KNOWN_TOOLS.iter().map(|id| id.to_string()).collect()
}

fn default_tool_visibility() -> BTreeMap<String, bool> {
    KNOWN_TOOLS.iter().map(|id| (id.to_string(), true)).collect()
}

fn default_label_service_url() -> String {
    DEFAULT_LABEL_SERVICE_URL.to_string()
}

impl Default for ToolkitSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            tool_order: default_tool_order(),
            tool_visibility: default_tool_visibility(),
            label_service_url: default_label_service_url(),
        }
    }
}

impl ToolkitSettings {
    /// Repairs a blob written by an older or hand-edited page: unknown and
    /// duplicate tools are dropped, missing tools are appended and shown.
    pub fn normalized(mut self) -> Self {
        let mut order: Vec<String> = Vec::with_capacity(KNOWN_TOOLS.len());
        for id in self.tool_order.drain(..) {
            if KNOWN_TOOLS.contains(&id.as_str()) && !order.contains(&id) {
                order.push(id);
            }
        }
        for id in KNOWN_TOOLS {
            if !order.iter().any(|existing| existing == id) {
                order.push(id.to_string());
            }
        }
        self.tool_order = order;
        self.tool_visibility
            .retain(|id, _| KNOWN_TOOLS.contains(&id.as_str()));
        for id in KNOWN_TOOLS {
            self.tool_visibility.entry(id.to_string()).or_insert(true);
        }
        if self.label_service_url.trim().is_empty() {
            self.label_service_url = default_label_service_url();
        }
        self
    }

    pub fn is_visible(&self, tool: &str) -> bool {
        self.tool_visibility.get(tool).copied().unwrap_or(false)
    }

    /// Visible tools in display order.
    pub fn visible_tools(&self) -> Vec<&str> {
        self.tool_order
            .iter()
            .map(String::as_str)
            .filter(|id| self.is_visible(id))
            .collect()
    }
}

/// Reads a stored blob. Absent or unreadable blobs fall back to defaults.
pub fn parse_settings(stored: Option<&str>) -> ToolkitSettings {
    let Some(raw) = stored.filter(|raw| !raw.trim().is_empty()) else {
        return ToolkitSettings::default();
    };
    match serde_json::from_str::<ToolkitSettings>(raw) {
        Ok(settings) => settings.normalized(),
        Err(err) => {
            log::warn!("ignoring unreadable settings blob: {err}");
            ToolkitSettings::default()
        }
    }
}

pub fn settings_to_json(settings: &ToolkitSettings) -> ToolkitResult<String> {
    serde_json::to_string(settings).map_err(|err| ToolkitError::Settings(err.to_string()))
}

#[cfg(target_arch = "wasm32")]
pub mod storage {
    //! `localStorage` access; every browser failure degrades to defaults on read.

    use web_sys::Storage;

    use super::{parse_settings, settings_to_json, ToolkitSettings, SETTINGS_KEY};
    use crate::error::{ToolkitError, ToolkitResult};

    fn local_storage() -> Option<Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }

    pub fn load() -> ToolkitSettings {
        let stored = local_storage().and_then(|storage| storage.get_item(SETTINGS_KEY).ok().flatten());
        parse_settings(stored.as_deref())
    }

    pub fn save(settings: &ToolkitSettings) -> ToolkitResult<()> {
        let json = settings_to_json(settings)?;
        let storage = local_storage()
            .ok_or_else(|| ToolkitError::Settings("localStorage is unavailable".into()))?;
        storage
            .set_item(SETTINGS_KEY, &json)
            .map_err(|_| ToolkitError::Settings("browser refused to store settings".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_blob_uses_defaults() {
        let settings = parse_settings(None);
        assert_eq!(settings, ToolkitSettings::default());
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.visible_tools(), KNOWN_TOOLS.to_vec());
        assert_eq!(settings.label_service_url, DEFAULT_LABEL_SERVICE_URL);
    }

    #[test]
    fn unreadable_blob_uses_defaults() {
        assert_eq!(parse_settings(Some("{not json")), ToolkitSettings::default());
        assert_eq!(parse_settings(Some("   ")), ToolkitSettings::default());
    }

    #[test]
    fn partial_blob_fills_missing_fields() {
        let settings = parse_settings(Some(r#"{"theme":"dark"}"#));
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.tool_order, default_tool_order());
    }

    #[test]
    fn order_is_repaired() {
        let settings = parse_settings(Some(
            r#"{"toolOrder":["sqlRangeJump","bogus","sqlRangeJump","labelPreview"],
                "toolVisibility":{"labelPreview":false,"bogus":true}}"#,
        ));
        assert_eq!(
            settings.tool_order,
            vec!["sqlRangeJump", "labelPreview", "rangeSplit", "carrierRoutes"]
        );
        assert!(!settings.tool_visibility.contains_key("bogus"));
        assert_eq!(
            settings.visible_tools(),
            vec!["sqlRangeJump", "rangeSplit", "carrierRoutes"]
        );
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let settings = ToolkitSettings {
            theme: Theme::Dark,
            ..ToolkitSettings::default()
        };
        let json = settings_to_json(&settings).unwrap();
        assert!(json.contains("\"toolOrder\""));
        assert!(json.contains("\"labelServiceUrl\""));
        assert!(json.contains("\"theme\":\"dark\""));
        assert_eq!(parse_settings(Some(&json)), settings);
    }
}
