use crate::Result;
use crate::types::OverlaySpec;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_SCOPE: &str = "tether_defaultscope";

/// Instance-wide defaults, filled into endpoint and connection parameters that leave a slot
/// empty.
///
/// Anchor, endpoint, connector and style values are opaque to the core and are handed through
/// to the router unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Defaults {
    pub anchor: Value,
    pub anchors: [Option<Value>; 2],
    pub connections_detachable: bool,
    pub connection_overlays: Vec<OverlaySpec>,
    pub connector: Value,
    pub endpoint: Value,
    pub endpoint_overlays: Vec<OverlaySpec>,
    pub endpoints: [Option<Value>; 2],
    pub endpoint_style: Value,
    pub endpoint_styles: [Option<Value>; 2],
    pub endpoint_hover_style: Option<Value>,
    pub endpoint_hover_styles: [Option<Value>; 2],
    pub hover_paint_style: Option<Value>,
    pub max_connections: i32,
    pub paint_style: Value,
    pub reattach_connections: bool,
    pub scope: String,
    pub allow_nested_groups: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            anchor: json!("Bottom"),
            anchors: [None, None],
            connections_detachable: true,
            connection_overlays: Vec::new(),
            connector: json!("Bezier"),
            endpoint: json!("Dot"),
            endpoint_overlays: Vec::new(),
            endpoints: [None, None],
            endpoint_style: json!({ "fill": "#456" }),
            endpoint_styles: [None, None],
            endpoint_hover_style: None,
            endpoint_hover_styles: [None, None],
            hover_paint_style: None,
            max_connections: 1,
            paint_style: json!({ "strokeWidth": 2, "stroke": "#456" }),
            reattach_connections: false,
            scope: DEFAULT_SCOPE.to_string(),
            allow_nested_groups: true,
        }
    }
}

impl Defaults {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Returns a copy with `overrides` merged on top (objects merge key by key, anything else
    /// replaces).
    pub fn merged_with(&self, overrides: &Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        deep_merge_value(&mut base, overrides);
        Ok(serde_json::from_value(base)?)
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
