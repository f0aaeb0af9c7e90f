//! Find-or-create widget edits on a page tree.
//!
//! Everything here is synchronous and in-memory. New widgets always attach
//! directly under the root; existing widgets are found anywhere in the tree.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::dsl::kind::WidgetKind;
use crate::dsl::spec::{ReportEntry, UpsertReport, WidgetSpec};
use crate::dsl::widget::{Edges, POSITION_KEYS, PathKey, PositionScheme, TYPED_KEYS, WidgetNode};
use crate::error::ValidationError;

/// Substring that marks a value as a live expression.
pub const EXPRESSION_MARKER: &str = "{{";

/// Box given to synthesized widgets before the requested edges are applied.
const DEFAULT_EDGES: [f64; 4] = [0.0, 0.0, 20.0, 4.0];

pub fn find_by_name<'a>(root: &'a WidgetNode, name: &str) -> Option<&'a WidgetNode> {
    root.iter().find(|w| w.widget_name == name)
}

pub fn find_first_by_type<'a>(root: &'a WidgetNode, widget_type: &str) -> Option<&'a WidgetNode> {
    root.iter().find(|w| w.widget_type == widget_type)
}

/// Mutable preorder lookup by name.
pub fn find_by_name_mut<'a>(node: &'a mut WidgetNode, name: &str) -> Option<&'a mut WidgetNode> {
    if node.widget_name == name {
        return Some(node);
    }
    for child in node.children.iter_mut() {
        if let Some(found) = find_by_name_mut(child, name) {
            return Some(found);
        }
    }
    None
}

pub fn all_widget_ids(root: &WidgetNode) -> HashSet<&str> {
    root.iter().map(|w| w.widget_id.as_str()).collect()
}

/// Event-handler properties are conventionally named `on...`.
pub fn is_trigger_key(key: &str) -> bool {
    key.starts_with("on")
}

pub fn is_expression(value: &str) -> bool {
    value.contains(EXPRESSION_MARKER)
}

/// Append `key` unless present. Returns whether it was added.
pub fn ensure_path(list: &mut Vec<PathKey>, key: &str) -> bool {
    if list.iter().any(|p| p.key == key) {
        return false;
    }
    list.push(PathKey::new(key));
    true
}

/// Overwrite one field, typed or not.
///
/// Position keys must be numbers. They are written into the scheme the node
/// already uses, so `left` on a grid widget lands in `leftColumn`.
pub fn set_property(widget: &mut WidgetNode, key: &str, value: Value) -> Result<(), ValidationError> {
    if let Some(index) = POSITION_KEYS.iter().position(|k| *k == key) {
        let Some(edge) = value.as_f64() else {
            return Err(ValidationError::InvalidProperty {
                widget_name: widget.widget_name.clone(),
                key: key.to_string(),
                reason: format!("expected a number, got {value}"),
            });
        };
        let own = if index < 4 {
            PositionScheme::Pixel
        } else {
            PositionScheme::Grid
        };
        let scheme = widget.position.scheme().unwrap_or(own);
        let mut update: Edges = [None; 4];
        update[index % 4] = Some(edge);
        widget.position.merge(scheme, update);
        return Ok(());
    }

    if !TYPED_KEYS.contains(&key) {
        widget.extra.insert(key.to_string(), value);
        return Ok(());
    }

    let invalid = |reason: String| ValidationError::InvalidProperty {
        widget_name: widget.widget_name.clone(),
        key: key.to_string(),
        reason,
    };

    let mut fields = match widget.to_value() {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(invalid("widget did not serialize to an object".to_string())),
        Err(e) => return Err(invalid(e.to_string())),
    };
    fields.insert(key.to_string(), value);
    let updated = WidgetNode::from_value(Value::Object(fields)).map_err(|e| invalid(e.to_string()))?;
    *widget = updated;
    Ok(())
}

/// Apply raw property overwrites, then bindings.
///
/// A binding whose value contains [`EXPRESSION_MARKER`] registers its key in
/// the trigger list (for `on...` keys) or the binding list (everything else).
/// Static binding values leave both lists alone.
pub fn apply_props_and_bindings(
    widget: &mut WidgetNode,
    props: &Map<String, Value>,
    bindings: &BTreeMap<String, String>,
) -> Result<(), ValidationError> {
    for (key, value) in props {
        set_property(widget, key, value.clone())?;
    }

    for (key, value) in bindings {
        set_property(widget, key, Value::String(value.clone()))?;
        if !is_expression(value) {
            continue;
        }
        if is_trigger_key(key) {
            ensure_path(&mut widget.dynamic_trigger_path_list, key);
        } else {
            ensure_path(&mut widget.dynamic_binding_path_list, key);
        }
    }
    Ok(())
}

/// Scheme for widgets that have no position yet: whatever the root's
/// children use, else the root's own, else the legacy pixel box.
pub fn default_scheme(root: &WidgetNode) -> PositionScheme {
    root.children
        .iter()
        .find_map(|c| c.position.scheme())
        .or_else(|| root.position.scheme())
        .unwrap_or(PositionScheme::Pixel)
}

/// A widget with only the fields every widget type needs.
pub fn minimal_widget(kind: WidgetKind, scheme: PositionScheme) -> WidgetNode {
    let mut widget = WidgetNode::new(Uuid::new_v4().to_string(), "", kind.tag());
    widget.position.set_edges(scheme, DEFAULT_EDGES.map(Some));
    widget.extra.insert("isVisible".to_string(), Value::Bool(true));
    widget.extra.insert("version".to_string(), Value::from(1));
    widget
}

fn fresh_id(existing: &HashSet<&str>) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !existing.contains(id.as_str()) {
            return id;
        }
    }
}

fn validate_spec(spec: &WidgetSpec) -> Result<WidgetKind, ValidationError> {
    if spec.widget_name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if spec.widget_type.trim().is_empty() {
        return Err(ValidationError::MissingType {
            widget_name: spec.widget_name.clone(),
        });
    }
    spec.widget_type
        .parse()
        .map_err(|_| ValidationError::UnknownType {
            widget_name: spec.widget_name.clone(),
            widget_type: spec.widget_type.clone(),
        })
}

fn entry(widget: &WidgetNode, cloned_from_template: Option<bool>) -> ReportEntry {
    ReportEntry {
        widget_name: widget.widget_name.clone(),
        widget_id: widget.widget_id.clone(),
        widget_type: widget.widget_type.clone(),
        cloned_from_template,
    }
}

/// Upsert widgets by name, in request order.
///
/// Edits run on a copy of the tree that replaces `root` only once every spec
/// has been applied, so a rejected call leaves `root` unmodified.
pub fn upsert(root: &mut WidgetNode, specs: &[WidgetSpec]) -> Result<UpsertReport, ValidationError> {
    if root.widget_id.trim().is_empty() {
        return Err(ValidationError::RootWithoutId);
    }
    let kinds = specs
        .iter()
        .map(validate_spec)
        .collect::<Result<Vec<_>, _>>()?;

    let mut work = root.clone();
    let root_id = work.widget_id.clone();
    let new_scheme = default_scheme(&work);
    let mut report = UpsertReport::default();

    for (spec, kind) in specs.iter().zip(kinds) {
        if let Some(existing) = find_by_name_mut(&mut work, &spec.widget_name) {
            if let Some(position) = &spec.position {
                if existing.position.is_mixed() {
                    tracing::debug!(widget = %existing.widget_name, "Dropping pixel edges of mixed position");
                }
                let scheme = existing.position.scheme().unwrap_or(new_scheme);
                existing.position.merge(scheme, position.edges());
            }
            apply_props_and_bindings(existing, &spec.props, &spec.bindings)?;
            tracing::debug!(widget = %existing.widget_name, "Updated widget");
            report.updated.push(entry(existing, None));
            continue;
        }

        let template = find_first_by_type(&work, kind.tag()).cloned();
        let cloned_from_template = template.is_some();
        let mut next = template.unwrap_or_else(|| minimal_widget(kind, new_scheme));

        next.widget_id = fresh_id(&all_widget_ids(&work));
        next.widget_name = spec.widget_name.clone();
        next.widget_type = kind.tag().to_string();
        next.parent_id = Some(root_id.clone());
        next.children.clear();
        if let Some(position) = &spec.position {
            let scheme = next.position.scheme().unwrap_or(new_scheme);
            next.position.merge(scheme, position.edges());
        }
        apply_props_and_bindings(&mut next, &spec.props, &spec.bindings)?;

        tracing::debug!(
            widget = %next.widget_name,
            widget_type = %next.widget_type,
            cloned_from_template,
            "Created widget"
        );
        report.created.push(entry(&next, Some(cloned_from_template)));
        work.children.push(next);
    }

    *root = work;
    Ok(report)
}

/// Shift the named widgets vertically. Returns the names that were found.
pub fn shift_rows(root: &mut WidgetNode, names: &[String], delta: f64) -> Vec<String> {
    let mut shifted = Vec::new();
    for name in names {
        if let Some(widget) = find_by_name_mut(root, name) {
            widget.position.shift_rows(delta);
            shifted.push(name.clone());
        }
    }
    shifted
}
