//! Typed widget node with an open extension map.
//!
//! Fields every widget carries are typed; everything else a widget type
//! defines (`text`, `onClick`, `buttonColor`, ...) lives in [`WidgetNode::extra`]
//! and survives a fetch/save cycle untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a dynamic path sidecar list (`{"key": "text"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathKey {
    pub key: String,
}

impl PathKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// The two positioning schemes Appsmith pages have used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionScheme {
    /// Legacy `left/top/right/bottom`.
    Pixel,
    /// `leftColumn/topRow/rightColumn/bottomRow`.
    Grid,
}

/// Edge values in `[left, top, right, bottom]` order.
pub type Edges = [Option<f64>; 4];

/// Position fields of a node. A well-formed node populates one scheme only.
///
/// An edge sent as `null` reads as absent and is left out on save.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "edge")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "edge")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "edge")]
    pub right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "edge")]
    pub bottom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "edge")]
    pub left_column: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "edge")]
    pub top_row: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "edge")]
    pub right_column: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "edge")]
    pub bottom_row: Option<f64>,
}

/// JSON key names of the position fields, pixel scheme first.
pub const POSITION_KEYS: [&str; 8] = [
    "left",
    "top",
    "right",
    "bottom",
    "leftColumn",
    "topRow",
    "rightColumn",
    "bottomRow",
];

impl Position {
    /// Scheme in use. Grid wins when a legacy node carries both.
    pub fn scheme(&self) -> Option<PositionScheme> {
        if self.grid().iter().any(Option::is_some) {
            Some(PositionScheme::Grid)
        } else if self.pixel().iter().any(Option::is_some) {
            Some(PositionScheme::Pixel)
        } else {
            None
        }
    }

    pub fn pixel(&self) -> Edges {
        [self.left, self.top, self.right, self.bottom]
    }

    pub fn grid(&self) -> Edges {
        [self.left_column, self.top_row, self.right_column, self.bottom_row]
    }

    /// True when fields from both schemes are present.
    pub fn is_mixed(&self) -> bool {
        self.grid().iter().any(Option::is_some) && self.pixel().iter().any(Option::is_some)
    }

    /// Edges as seen in `scheme`, falling back to the other scheme per edge.
    pub fn edges_in(&self, scheme: PositionScheme) -> Edges {
        let (primary, secondary) = match scheme {
            PositionScheme::Pixel => (self.pixel(), self.grid()),
            PositionScheme::Grid => (self.grid(), self.pixel()),
        };
        std::array::from_fn(|i| primary[i].or(secondary[i]))
    }

    /// Write edges into `scheme` and clear the other one.
    pub fn set_edges(&mut self, scheme: PositionScheme, edges: Edges) {
        let [l, t, r, b] = edges;
        *self = match scheme {
            PositionScheme::Pixel => Position {
                left: l,
                top: t,
                right: r,
                bottom: b,
                ..Position::default()
            },
            PositionScheme::Grid => Position {
                left_column: l,
                top_row: t,
                right_column: r,
                bottom_row: b,
                ..Position::default()
            },
        };
    }

    /// Overwrite only the `Some` edges of `update`, keeping the node in one scheme.
    pub fn merge(&mut self, scheme: PositionScheme, update: Edges) {
        let current = self.edges_in(scheme);
        let merged = std::array::from_fn(|i| update[i].or(current[i]));
        self.set_edges(scheme, merged);
    }

    /// Move vertically by `delta` rows (or pixels, for the legacy scheme).
    pub fn shift_rows(&mut self, delta: f64) {
        let Some(scheme) = self.scheme() else {
            return;
        };
        let [l, t, r, b] = self.edges_in(scheme);
        self.set_edges(scheme, [l, t.map(|v| v + delta), r, b.map(|v| v + delta)]);
    }
}

mod edge {
    use serde::{Deserialize, Deserializer, Serializer};

    // Appsmith stores integral coordinates as JSON integers; keep them that way.
    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*v as i64)
            }
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Option::<f64>::deserialize(deserializer)
    }
}

/// A node of the page DSL tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetNode {
    /// Opaque identifier. Empty when the source JSON had none.
    #[serde(default, alias = "widgetID")]
    pub widget_id: String,
    /// Human-assigned name, unique within a page.
    #[serde(default)]
    pub widget_name: String,
    /// Widget type tag, e.g. `BUTTON_WIDGET`.
    #[serde(rename = "type", default)]
    pub widget_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(flatten)]
    pub position: Position,
    #[serde(default)]
    pub children: Vec<WidgetNode>,
    #[serde(default)]
    pub dynamic_binding_path_list: Vec<PathKey>,
    #[serde(default)]
    pub dynamic_trigger_path_list: Vec<PathKey>,
    #[serde(default)]
    pub dynamic_property_path_list: Vec<PathKey>,
    /// Every other field, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JSON keys backed by typed fields rather than [`WidgetNode::extra`].
pub const TYPED_KEYS: [&str; 8] = [
    "widgetId",
    "widgetName",
    "type",
    "parentId",
    "children",
    "dynamicBindingPathList",
    "dynamicTriggerPathList",
    "dynamicPropertyPathList",
];

impl WidgetNode {
    /// A bare node; callers fill in position and properties.
    pub fn new(
        widget_id: impl Into<String>,
        widget_name: impl Into<String>,
        widget_type: impl Into<String>,
    ) -> Self {
        Self {
            widget_id: widget_id.into(),
            widget_name: widget_name.into(),
            widget_type: widget_type.into(),
            parent_id: None,
            position: Position::default(),
            children: Vec::new(),
            dynamic_binding_path_list: Vec::new(),
            dynamic_trigger_path_list: Vec::new(),
            dynamic_property_path_list: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Preorder walk: a node before its children, children in order.
    pub fn iter(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }
}

/// Preorder iterator over a widget subtree.
pub struct Preorder<'a> {
    stack: Vec<&'a WidgetNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a WidgetNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
