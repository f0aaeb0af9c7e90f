//! Page, layout and widget subcommands.

use anyhow::Context;
use clap::Subcommand;
use serde_json::Value;

use crate::appsmith::page_edit;
use crate::appsmith::{AppsmithApi, LayoutSave, PageTarget};
use crate::cli::parse_json_arg;
use crate::dsl::{self, WidgetSpec};
use crate::error::ValidationError;

#[derive(Subcommand, Debug, Clone)]
pub enum PagesCommand {
    /// List the pages of an application
    List {
        /// Application id
        #[arg(long)]
        app: String,
    },

    /// Fetch a page with its layouts and DSL
    Fetch {
        /// Page id
        #[arg(long)]
        page: String,

        /// Let the server migrate the DSL to its current shape first
        #[arg(long)]
        migrate_dsl: bool,
    },

    /// Find a page by name, creating it when missing
    Ensure {
        /// Application id
        #[arg(long)]
        app: String,

        /// Page name
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum LayoutCommand {
    /// Overwrite a layout with a complete DSL
    Save {
        #[arg(long)]
        app: String,
        #[arg(long)]
        page: String,
        #[arg(long)]
        layout: String,
        /// DSL as JSON, or @file
        #[arg(long)]
        dsl: String,
    },

    /// Show the top-level keys of a layout's DSL
    Keys {
        #[arg(long)]
        app: String,
        #[arg(long)]
        page: String,
        #[arg(long)]
        layout: Option<String>,
    },

    /// Save a layout with an empty on-load action plan
    ClearOnload {
        #[arg(long)]
        app: String,
        #[arg(long)]
        page: String,
        #[arg(long)]
        layout: Option<String>,
        /// Publish the application afterwards
        #[arg(long)]
        publish: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum WidgetsCommand {
    /// Upsert widgets by name into a fixed-layout page and save it
    Upsert {
        #[arg(long)]
        app: String,
        #[arg(long)]
        page: String,
        #[arg(long)]
        layout: Option<String>,
        /// Array of widget specs as JSON, or @file
        #[arg(long)]
        widgets: String,
        /// Publish the application afterwards
        #[arg(long)]
        publish: bool,
    },

    /// Move widgets vertically by a number of rows and save the page
    Shift {
        #[arg(long)]
        app: String,
        #[arg(long)]
        page: String,
        #[arg(long)]
        layout: Option<String>,
        /// Widget names, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        names: Vec<String>,
        /// Rows to move down; negative moves up
        #[arg(long, allow_hyphen_values = true)]
        delta: f64,
        /// Publish the application afterwards
        #[arg(long)]
        publish: bool,
    },

    /// Print one widget of a page by name
    Find {
        #[arg(long)]
        page: String,
        #[arg(long)]
        layout: Option<String>,
        /// Widget name
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum RefsCommand {
    /// Rename an action in every expression of a page
    Replace {
        #[arg(long)]
        app: String,
        #[arg(long)]
        page: String,
        #[arg(long)]
        layout: Option<String>,
        /// Current action name
        #[arg(long)]
        from: String,
        /// New action name
        #[arg(long)]
        to: String,
        /// Publish the application afterwards
        #[arg(long)]
        publish: bool,
    },
}

fn target(app: String, page: String, layout: Option<String>) -> PageTarget {
    PageTarget {
        application_id: app,
        page_id: page,
        layout_id: layout,
    }
}

/// Widget specs from a JSON array, or an object with a `widgets` array.
pub fn parse_widget_specs(raw: &str) -> anyhow::Result<Vec<WidgetSpec>> {
    let value = parse_json_arg(raw)?;
    let list = match value {
        Value::Object(mut fields) => fields.remove("widgets").unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(list).context("widget specs must be an array of {widgetName, type, ...}")
}

pub async fn run_pages_command(api: &AppsmithApi, cmd: PagesCommand) -> anyhow::Result<Value> {
    let value = match cmd {
        PagesCommand::List { app } => api.list_pages(&app).await?,
        PagesCommand::Fetch { page, migrate_dsl } => api.fetch_page(&page, migrate_dsl).await?,
        PagesCommand::Ensure { app, name } => serde_json::to_value(api.ensure_page(&app, &name).await?)?,
    };
    Ok(value)
}

pub async fn run_layout_command(api: &AppsmithApi, cmd: LayoutCommand) -> anyhow::Result<Value> {
    let value = match cmd {
        LayoutCommand::Save {
            app,
            page,
            layout,
            dsl,
        } => {
            let dsl = parse_json_arg(&dsl)?;
            let target = target(app, page, None);
            api.save_layout(&target, &layout, &LayoutSave::dsl(dsl))
                .await?
        }
        LayoutCommand::Keys { app, page, layout } => {
            page_edit::layout_keys(api, &target(app, page, layout)).await?
        }
        LayoutCommand::ClearOnload {
            app,
            page,
            layout,
            publish,
        } => {
            let outcome =
                page_edit::clear_on_load_actions(api, &target(app, page, layout), publish).await?;
            serde_json::to_value(outcome)?
        }
    };
    Ok(value)
}

pub async fn run_widgets_command(api: &AppsmithApi, cmd: WidgetsCommand) -> anyhow::Result<Value> {
    let value = match cmd {
        WidgetsCommand::Upsert {
            app,
            page,
            layout,
            widgets,
            publish,
        } => {
            let specs = parse_widget_specs(&widgets)?;
            let outcome =
                page_edit::upsert_widgets(api, &target(app, page, layout), &specs, publish).await?;
            serde_json::to_value(outcome)?
        }
        WidgetsCommand::Shift {
            app,
            page,
            layout,
            names,
            delta,
            publish,
        } => {
            let outcome =
                page_edit::shift_widgets(api, &target(app, page, layout), &names, delta, publish)
                    .await?;
            serde_json::to_value(outcome)?
        }
        WidgetsCommand::Find { page, layout, name } => {
            let layout = api.fetch_layout(&page, layout.as_deref()).await?;
            let widget = dsl::find_by_name(&layout.dsl, &name).ok_or_else(|| {
                ValidationError::WidgetNotFound {
                    widget_name: name.clone(),
                }
            })?;
            widget.to_value()?
        }
    };
    Ok(value)
}

pub async fn run_refs_command(api: &AppsmithApi, cmd: RefsCommand) -> anyhow::Result<Value> {
    let RefsCommand::Replace {
        app,
        page,
        layout,
        from,
        to,
        publish,
    } = cmd;
    let outcome =
        page_edit::replace_action_refs(api, &target(app, page, layout), &from, &to, publish).await?;
    Ok(serde_json::to_value(outcome)?)
}
