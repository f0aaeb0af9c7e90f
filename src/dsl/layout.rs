//! Page layout system detection.

use serde_json::Value;

use crate::error::ValidationError;

/// How a page positions its widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSystem {
    /// Absolute boxes. The only system the editor writes to.
    Fixed,
    /// A responsive flow layout, carrying the raw flag as seen on the page.
    Auto(String),
}

impl LayoutSystem {
    /// Classify from the DSL-level flag, falling back to the layout-level one.
    ///
    /// A missing or non-string flag counts as fixed. Anything whose upper-case
    /// form contains `AUTO` is responsive.
    pub fn detect(dsl_flag: Option<&Value>, layout_flag: Option<&Value>) -> Self {
        let flag = [dsl_flag, layout_flag]
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty());

        match flag {
            Some(raw) if raw.to_uppercase().contains("AUTO") => Self::Auto(raw.to_string()),
            _ => Self::Fixed,
        }
    }

    /// Reject anything but a fixed layout.
    pub fn ensure_fixed(&self) -> Result<(), ValidationError> {
        match self {
            Self::Fixed => Ok(()),
            Self::Auto(raw) => Err(ValidationError::AutoLayout {
                layout_system: raw.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_flags_mean_fixed() {
        assert_eq!(LayoutSystem::detect(None, None), LayoutSystem::Fixed);
        assert_eq!(
            LayoutSystem::detect(Some(&json!("FIXED")), None),
            LayoutSystem::Fixed
        );
        assert_eq!(LayoutSystem::detect(Some(&json!(3)), None), LayoutSystem::Fixed);
    }

    #[test]
    fn test_auto_detected_case_insensitively() {
        let detected = LayoutSystem::detect(None, Some(&json!("autoLayout")));
        assert_eq!(detected, LayoutSystem::Auto("autoLayout".to_string()));
    }

    #[test]
    fn test_dsl_flag_wins_over_layout_flag() {
        let detected = LayoutSystem::detect(Some(&json!("FIXED")), Some(&json!("AUTO")));
        assert_eq!(detected, LayoutSystem::Fixed);

        let detected = LayoutSystem::detect(Some(&json!("")), Some(&json!("AUTO")));
        assert_eq!(detected, LayoutSystem::Auto("AUTO".to_string()));
    }

    #[test]
    fn test_ensure_fixed_rejects_auto() {
        let err = LayoutSystem::Auto("AUTO".to_string())
            .ensure_fixed()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::AutoLayout {
                layout_system: "AUTO".to_string()
            }
        );
        assert!(err.to_string().contains("FIXED"));
        assert!(LayoutSystem::Fixed.ensure_fixed().is_ok());
    }
}
