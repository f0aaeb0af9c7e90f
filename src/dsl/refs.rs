//! Whole-word identifier rewrites across a widget tree.

use regex::Regex;
use serde_json::Value;

use crate::dsl::widget::WidgetNode;
use crate::error::{Error, ValidationError};

/// Rename every whole-word occurrence of `from` inside any string of the
/// tree, extension fields included. Returns the number of replacements.
///
/// Keys are left alone; only string values are rewritten.
pub fn replace_identifier(root: &mut WidgetNode, from: &str, to: &str) -> Result<usize, Error> {
    if from.is_empty() {
        return Err(ValidationError::EmptyIdentifier.into());
    }
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(from)))
        .map_err(|e| ValidationError::InvalidIdentifier {
            identifier: from.to_string(),
            reason: e.to_string(),
        })?;

    let mut value = root.to_value()?;
    let count = replace_in_value(&mut value, &pattern, to);
    if count > 0 {
        *root = WidgetNode::from_value(value)?;
    }
    Ok(count)
}

fn replace_in_value(value: &mut Value, pattern: &Regex, to: &str) -> usize {
    match value {
        Value::String(s) => {
            let hits = pattern.find_iter(s).count();
            if hits > 0 {
                *s = pattern
                    .replace_all(s, regex::NoExpand(to))
                    .into_owned();
            }
            hits
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|v| replace_in_value(v, pattern, to))
            .sum(),
        Value::Object(fields) => fields
            .values_mut()
            .map(|v| replace_in_value(v, pattern, to))
            .sum(),
        _ => 0,
    }
}
