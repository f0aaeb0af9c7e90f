//! Shapes of the Appsmith payloads this crate reads or writes.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dsl::{LayoutSystem, UpsertReport, WidgetNode};
use crate::error::ValidationError;

/// Which page a workflow edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTarget {
    pub application_id: String,
    pub page_id: String,
    /// Layout to edit; the first layout of the page when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
}

impl PageTarget {
    pub fn new(application_id: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            page_id: page_id.into(),
            layout_id: None,
        }
    }

    pub fn with_layout(mut self, layout_id: impl Into<String>) -> Self {
        self.layout_id = Some(layout_id.into());
        self
    }
}

/// One layout of a fetched page, with its tree parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub page_id: String,
    pub layout_id: String,
    pub layout_system: LayoutSystem,
    pub dsl: WidgetNode,
}

impl PageLayout {
    /// Pick a layout out of a `GET /api/v1/pages/{id}` body.
    ///
    /// The layout whose id matches `wanted` is preferred; otherwise the first
    /// one is used.
    pub fn from_page(page_id: &str, page: &Value, wanted: Option<&str>) -> Result<Self, ValidationError> {
        let (chosen, layout_id) = select_layout(page_id, page, wanted)?;

        let raw_dsl = chosen
            .get("dsl")
            .filter(|d| d.is_object())
            .ok_or_else(|| ValidationError::NoLayout {
                page_id: page_id.to_string(),
                detail: format!(" (layout {layout_id} has no dsl field)"),
            })?;

        let layout_system = LayoutSystem::detect(
            raw_dsl.get("layoutSystemType"),
            chosen.get("layoutSystemType"),
        );
        let dsl = WidgetNode::from_value(raw_dsl.clone()).map_err(|e| {
            ValidationError::MalformedResponse {
                endpoint: format!("/api/v1/pages/{page_id}"),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            page_id: page_id.to_string(),
            layout_id,
            layout_system,
            dsl,
        })
    }
}

/// Raw layout object of a page body and its id, chosen as in
/// [`PageLayout::from_page`].
pub fn select_layout<'a>(
    page_id: &str,
    page: &'a Value,
    wanted: Option<&str>,
) -> Result<(&'a Value, String), ValidationError> {
    let no_layout = |detail: &str| ValidationError::NoLayout {
        page_id: page_id.to_string(),
        detail: detail.to_string(),
    };

    let layouts = page
        .pointer("/data/layouts")
        .and_then(Value::as_array)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| no_layout(" (fetch returned no layouts)"))?;

    let chosen = wanted
        .and_then(|id| {
            layouts
                .iter()
                .find(|l| l.get("id").and_then(Value::as_str) == Some(id))
        })
        .unwrap_or(&layouts[0]);

    let layout_id = chosen
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| no_layout(" (could not determine layout id)"))?
        .to_string();
    Ok((chosen, layout_id))
}

/// First layout id of a page body, falling back to `data.layoutId`.
pub fn first_layout_id(page: &Value) -> Option<String> {
    page.pointer("/data/layouts/0/id")
        .or_else(|| page.pointer("/data/layoutId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Body of `PUT /api/v1/layouts/{layoutId}/pages/{pageId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSave {
    pub dsl: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_on_load_actions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_on_load_action_errors: Option<Value>,
}

impl LayoutSave {
    pub fn dsl(dsl: Value) -> Self {
        Self {
            dsl,
            layout_on_load_actions: None,
            layout_on_load_action_errors: None,
        }
    }

    /// Save `dsl` with an empty on-load plan.
    pub fn clearing_on_load(dsl: Value) -> Self {
        Self {
            dsl,
            layout_on_load_actions: Some(Value::Array(vec![Value::Array(Vec::new())])),
            layout_on_load_action_errors: Some(Value::Array(Vec::new())),
        }
    }
}

/// Result of ensuring a page exists by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsuredPage {
    pub created: bool,
    pub page_id: String,
    pub layout_id: Option<String>,
    pub page_name: String,
    /// Which request shape created the page, when one was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_variant: Option<CreatePageVariant>,
}

/// Request shapes for `POST /api/v1/pages`, in the order they are tried.
///
/// Appsmith versions disagree on whether the application id travels in the
/// body, the query string, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatePageVariant {
    /// Body `{applicationId, name}`, no query.
    BodyOnly,
    /// Query `applicationId`, body `{name}`.
    QueryOnly,
    /// Query `applicationId`, body `{applicationId, name}`.
    QueryAndBody,
}

impl CreatePageVariant {
    pub const ORDER: [CreatePageVariant; 3] = [
        CreatePageVariant::BodyOnly,
        CreatePageVariant::QueryOnly,
        CreatePageVariant::QueryAndBody,
    ];

    pub fn sends_query(&self) -> bool {
        !matches!(self, Self::BodyOnly)
    }

    pub fn body(&self, application_id: &str, name: &str) -> Value {
        match self {
            Self::QueryOnly => serde_json::json!({ "name": name }),
            Self::BodyOnly | Self::QueryAndBody => {
                serde_json::json!({ "applicationId": application_id, "name": name })
            }
        }
    }
}

/// One failed create attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePageAttempt {
    pub variant: CreatePageVariant,
    pub error: String,
}

/// A successful page creation and the attempts that failed before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPage {
    pub variant: CreatePageVariant,
    pub failures: Vec<CreatePageAttempt>,
    pub response: Value,
}

impl CreatedPage {
    /// New page id from `data.id`, `data.page.id` or `data.pageId`.
    pub fn page_id(&self) -> Option<&str> {
        ["/data/id", "/data/page/id", "/data/pageId"]
            .iter()
            .find_map(|p| self.response.pointer(p).and_then(Value::as_str))
    }
}

/// Archive format of an exported application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Zip,
}

impl ExportFormat {
    /// JSON when the server says so or the body opens with `{`.
    pub fn detect(content_type: &str, bytes: &[u8]) -> Self {
        if content_type.contains("application/json") || bytes.first() == Some(&b'{') {
            Self::Json
        } else {
            Self::Zip
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Zip => "zip",
        }
    }
}

/// Raw export of one application.
#[derive(Debug, Clone)]
pub struct ExportedApp {
    pub app_id: String,
    pub content_type: String,
    pub format: ExportFormat,
    pub bytes: Bytes,
}

/// Where an export was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedExport {
    pub file_path: PathBuf,
    pub bytes: usize,
    pub content_type: String,
}

impl ExportedApp {
    /// `{app_id}-{YYYYMMDD-HHMMSS}Z.{ext}`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.{}",
            self.app_id,
            Utc::now().format("%Y%m%d-%H%M%SZ"),
            self.format.extension()
        )
    }

    /// Write into `dir`, creating it if needed.
    pub async fn save_to(&self, dir: &Path) -> std::io::Result<SavedExport> {
        tokio::fs::create_dir_all(dir).await?;
        let file_path = dir.join(self.file_name());
        tokio::fs::write(&file_path, &self.bytes).await?;
        Ok(SavedExport {
            file_path,
            bytes: self.bytes.len(),
            content_type: self.content_type.clone(),
        })
    }
}

/// What a page edit did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEditOutcome {
    pub page_id: String,
    pub layout_id: String,
    /// Present for widget upserts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<UpsertReport>,
    /// Number of rewritten references, for reference replacements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacements: Option<usize>,
    /// Names that were found and moved, for row shifts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shifted: Option<Vec<String>>,
    /// Start of the save response.
    pub save_preview: String,
    pub published: bool,
}
