//! Typed wrappers over the Appsmith REST endpoints.
//!
//! Every call probes the session first, so an expired session logs back in
//! transparently.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};

use crate::appsmith::session::{RequestOptions, SessionClient};
use crate::appsmith::types::{
    CreatePageAttempt, CreatePageVariant, CreatedPage, EnsuredPage, ExportFormat, ExportedApp,
    LayoutSave, PageLayout, PageTarget, first_layout_id,
};
use crate::error::{Error, Result, ValidationError};

fn seg(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Multipart form from the `form` object of an execute payload; non-string
/// values are sent as their JSON text.
pub fn execute_form(fields: &Map<String, Value>) -> Form {
    fields.iter().fold(Form::new(), |form, (key, value)| {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        form.text(key.clone(), text)
    })
}

/// Execute payloads with an object `form` field go out as multipart.
pub fn multipart_fields(payload: &Value) -> Option<&Map<String, Value>> {
    payload.get("form").and_then(Value::as_object)
}

/// Endpoint layer over a [`SessionClient`].
#[derive(Debug)]
pub struct AppsmithApi {
    session: SessionClient,
}

impl AppsmithApi {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    async fn call(&self, method: Method, path: &str, options: RequestOptions) -> Result<Value> {
        self.session.ensure_logged_in().await?;
        Ok(self.session.request(method, path, options).await?.body)
    }

    async fn get(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.call(Method::GET, path, options).await
    }

    pub async fn list_workspaces(&self) -> Result<Value> {
        self.get("/api/v1/workspaces/home", RequestOptions::new())
            .await
    }

    pub async fn list_apps(&self, workspace_id: &str) -> Result<Value> {
        self.get(
            "/api/v1/applications/home",
            RequestOptions::new().query("workspaceId", workspace_id),
        )
        .await
    }

    /// Download an application export.
    pub async fn export_app(&self, app_id: &str, branch_name: Option<&str>) -> Result<ExportedApp> {
        self.session.ensure_logged_in().await?;
        let response = self
            .session
            .request(
                Method::GET,
                &format!("/api/v1/applications/export/{}", seg(app_id)),
                RequestOptions::new().query_opt("branchName", branch_name),
            )
            .await?;

        let content_type = response
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let format = ExportFormat::detect(&content_type, &response.bytes);
        tracing::info!(app_id, bytes = response.bytes.len(), ?format, "Exported application");
        Ok(ExportedApp {
            app_id: app_id.to_string(),
            content_type,
            format,
            bytes: response.bytes,
        })
    }

    /// Import an export file into a workspace, optionally replacing an app.
    pub async fn import_app(
        &self,
        workspace_id: &str,
        file_path: &Path,
        replace_app_id: Option<&str>,
    ) -> Result<Value> {
        let contents = tokio::fs::read(file_path).await?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app.json".to_string());
        let part = Part::bytes(contents)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;

        self.call(
            Method::POST,
            &format!("/api/v1/applications/import/{}", seg(workspace_id)),
            RequestOptions::new()
                .query_opt("applicationId", replace_app_id)
                .multipart(Form::new().part("file", part)),
        )
        .await
    }

    pub async fn publish(&self, application_id: &str) -> Result<Value> {
        let body = self
            .call(
                Method::POST,
                &format!("/api/v1/applications/publish/{}", seg(application_id)),
                RequestOptions::new().json(Value::Object(Map::new())),
            )
            .await?;
        tracing::info!(application_id, "Published application");
        Ok(body)
    }

    pub async fn list_pages(&self, application_id: &str) -> Result<Value> {
        self.get(
            "/api/v1/pages",
            RequestOptions::new().query("applicationId", application_id),
        )
        .await
    }

    /// Full page body, layouts and DSL included.
    pub async fn fetch_page(&self, page_id: &str, migrate_dsl: bool) -> Result<Value> {
        self.get(
            &format!("/api/v1/pages/{}", seg(page_id)),
            RequestOptions::new().query("migrateDsl", bool_param(migrate_dsl)),
        )
        .await
    }

    /// Fetch a page without server-side migration and parse one layout.
    pub async fn fetch_layout(&self, page_id: &str, layout_id: Option<&str>) -> Result<PageLayout> {
        let page = self.fetch_page(page_id, false).await?;
        Ok(PageLayout::from_page(page_id, &page, layout_id)?)
    }

    /// Overwrite a layout with a complete tree.
    pub async fn save_layout(&self, target: &PageTarget, layout_id: &str, save: &LayoutSave) -> Result<Value> {
        let body = self
            .call(
                Method::PUT,
                &format!(
                    "/api/v1/layouts/{}/pages/{}",
                    seg(layout_id),
                    seg(&target.page_id)
                ),
                RequestOptions::new()
                    .query("applicationId", target.application_id.as_str())
                    .json(serde_json::to_value(save)?),
            )
            .await?;
        tracing::info!(page_id = %target.page_id, layout_id, "Saved layout");
        Ok(body)
    }

    /// Create a page, trying each [`CreatePageVariant`] in order.
    ///
    /// Stops at the first success. When every variant fails, the last error
    /// is returned.
    pub async fn create_page(&self, application_id: &str, name: &str) -> Result<CreatedPage> {
        self.session.ensure_logged_in().await?;

        let mut failures = Vec::new();
        let mut last_err = None;
        for variant in CreatePageVariant::ORDER {
            let mut options = RequestOptions::new().json(variant.body(application_id, name));
            if variant.sends_query() {
                options = options.query("applicationId", application_id);
            }
            match self.session.request(Method::POST, "/api/v1/pages", options).await {
                Ok(response) => {
                    tracing::info!(application_id, name, ?variant, "Created page");
                    return Ok(CreatedPage {
                        variant,
                        failures,
                        response: response.body,
                    });
                }
                Err(e) => {
                    tracing::warn!(?variant, error = %e, "Page create attempt failed");
                    failures.push(CreatePageAttempt {
                        variant,
                        error: e.to_string(),
                    });
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::Protocol {
            reason: "no page create variants to try".to_string(),
        }))
    }

    /// Find a page by name, creating it when missing.
    pub async fn ensure_page(&self, application_id: &str, page_name: &str) -> Result<EnsuredPage> {
        let pages = self.list_pages(application_id).await?;
        let existing = pages
            .pointer("/data/pages")
            .or_else(|| pages.get("pages"))
            .and_then(Value::as_array)
            .and_then(|list| {
                list.iter()
                    .find(|p| p.get("name").and_then(Value::as_str) == Some(page_name))
            })
            .and_then(|p| p.get("id").and_then(Value::as_str))
            .map(str::to_string);

        let (page_id, create_variant) = match existing {
            Some(id) => (id, None),
            None => {
                let created = self.create_page(application_id, page_name).await?;
                let id = created.page_id().map(str::to_string).ok_or_else(|| {
                    ValidationError::MalformedResponse {
                        endpoint: "/api/v1/pages".to_string(),
                        reason: format!(
                            "page created but no id in response: {}",
                            crate::util::truncate_preview(&created.response.to_string(), 1200)
                        ),
                    }
                })?;
                (id, Some(created.variant))
            }
        };

        let page = self.fetch_page(&page_id, false).await?;
        Ok(EnsuredPage {
            created: create_variant.is_some(),
            page_id,
            layout_id: first_layout_id(&page),
            page_name: page_name.to_string(),
            create_variant,
        })
    }

    pub async fn list_datasources(&self, workspace_id: &str) -> Result<Value> {
        self.get(
            "/api/v1/datasources",
            RequestOptions::new().query("workspaceId", workspace_id),
        )
        .await
    }

    pub async fn create_datasource(&self, payload: Value) -> Result<Value> {
        self.call(
            Method::POST,
            "/api/v1/datasources",
            RequestOptions::new().json(payload),
        )
        .await
    }

    pub async fn test_datasource(&self, payload: Value) -> Result<Value> {
        self.call(
            Method::POST,
            "/api/v1/datasources/test",
            RequestOptions::new().json(payload),
        )
        .await
    }

    pub async fn update_datasource(&self, id: &str, payload: Value) -> Result<Value> {
        self.call(
            Method::PUT,
            &format!("/api/v1/datasources/{}", seg(id)),
            RequestOptions::new().json(payload),
        )
        .await
    }

    pub async fn datasource_structure(&self, id: &str, ignore_cache: bool) -> Result<Value> {
        self.get(
            &format!("/api/v1/datasources/{}/structure", seg(id)),
            RequestOptions::new().query("ignoreCache", bool_param(ignore_cache)),
        )
        .await
    }

    pub async fn list_actions(&self, page_id: &str) -> Result<Value> {
        self.get("/api/v1/actions", RequestOptions::new().query("pageId", page_id))
            .await
    }

    pub async fn create_action(&self, payload: Value) -> Result<Value> {
        self.call(Method::POST, "/api/v1/actions", RequestOptions::new().json(payload))
            .await
    }

    pub async fn update_action(&self, id: &str, payload: Value) -> Result<Value> {
        self.call(
            Method::PUT,
            &format!("/api/v1/actions/{}", seg(id)),
            RequestOptions::new().json(payload),
        )
        .await
    }

    /// Run an action. A payload with an object `form` field is sent as
    /// multipart built from that field; anything else is sent as JSON.
    pub async fn execute_action(&self, payload: Value) -> Result<Value> {
        let options = match multipart_fields(&payload) {
            Some(fields) => RequestOptions::new().multipart(execute_form(fields)),
            None => RequestOptions::new().json(payload),
        };
        self.call(Method::POST, "/api/v1/actions/execute", options)
            .await
    }

    /// Flip `executeOnLoad` on the action named `action_name` of a page and
    /// write the whole action back.
    pub async fn set_execute_on_load(
        &self,
        page_id: &str,
        action_name: &str,
        execute_on_load: bool,
    ) -> Result<Value> {
        let actions = self.list_actions(page_id).await?;
        let mut action = actions
            .get("data")
            .and_then(Value::as_array)
            .and_then(|list| {
                list.iter()
                    .find(|a| a.get("name").and_then(Value::as_str) == Some(action_name))
            })
            .cloned()
            .ok_or_else(|| ValidationError::ActionNotFound {
                action_name: action_name.to_string(),
                page_id: page_id.to_string(),
            })?;

        let id = action
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ValidationError::MalformedResponse {
                endpoint: "/api/v1/actions".to_string(),
                reason: format!("action '{action_name}' has no id"),
            })?;

        if let Some(fields) = action.as_object_mut() {
            fields.insert("executeOnLoad".to_string(), Value::Bool(execute_on_load));
        }
        tracing::info!(action_name, execute_on_load, "Updating executeOnLoad");
        self.update_action(&id, action).await
    }
}
