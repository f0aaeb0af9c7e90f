//! Caller input for upserts and the report they produce.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dsl::widget::Edges;

/// Requested edges; unset edges keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
}

impl EdgeSpec {
    /// All four edges.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left: Some(left),
            top: Some(top),
            right: Some(right),
            bottom: Some(bottom),
        }
    }

    pub fn edges(&self) -> Edges {
        [self.left, self.top, self.right, self.bottom]
    }
}

/// A desired widget, keyed by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSpec {
    #[serde(default)]
    pub widget_name: String,
    /// Tag or friendly alias, see [`crate::dsl::WidgetKind`].
    #[serde(rename = "type", default)]
    pub widget_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<EdgeSpec>,
    /// Raw field overwrites.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Map<String, Value>,
    /// Field overwrites that may hold `{{ }}` expressions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, String>,
}

impl WidgetSpec {
    pub fn new(widget_name: impl Into<String>, widget_type: impl Into<String>) -> Self {
        Self {
            widget_name: widget_name.into(),
            widget_type: widget_type.into(),
            ..Self::default()
        }
    }

    pub fn at(mut self, position: EdgeSpec) -> Self {
        self.position = Some(position);
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn binding(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.insert(key.into(), value.into());
        self
    }
}

/// One line of an [`UpsertReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub widget_name: String,
    pub widget_id: String,
    #[serde(rename = "type")]
    pub widget_type: String,
    /// Set on created entries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloned_from_template: Option<bool>,
}

/// What an upsert did, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpsertReport {
    pub created: Vec<ReportEntry>,
    pub updated: Vec<ReportEntry>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_spec_parses_from_tool_payload() {
        let spec: WidgetSpec = serde_json::from_value(json!({
            "widgetName": "Btn_X",
            "type": "Button",
            "position": {"left": 0, "top": 0, "right": 10},
            "props": {"text": "Go"},
            "bindings": {"onClick": "{{doThing()}}"}
        }))
        .unwrap();

        assert_eq!(spec.widget_name, "Btn_X");
        assert_eq!(
            spec.position.unwrap().edges(),
            [Some(0.0), Some(0.0), Some(10.0), None]
        );
        assert_eq!(spec.props.get("text"), Some(&json!("Go")));
        assert_eq!(spec.bindings.get("onClick").map(String::as_str), Some("{{doThing()}}"));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = UpsertReport {
            created: vec![ReportEntry {
                widget_name: "Btn_X".to_string(),
                widget_id: "id-1".to_string(),
                widget_type: "BUTTON_WIDGET".to_string(),
                cloned_from_template: Some(false),
            }],
            updated: Vec::new(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["created"][0]["widgetName"], "Btn_X");
        assert_eq!(value["created"][0]["type"], "BUTTON_WIDGET");
        assert_eq!(value["created"][0]["clonedFromTemplate"], false);
    }
}
