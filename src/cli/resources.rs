//! Datasource and action subcommands. Payloads are passed through as JSON.

use clap::Subcommand;
use serde_json::Value;

use crate::appsmith::AppsmithApi;
use crate::cli::parse_json_arg;

#[derive(Subcommand, Debug, Clone)]
pub enum DatasourcesCommand {
    /// List the datasources of a workspace
    List {
        #[arg(long)]
        workspace: String,
    },

    /// Create a datasource
    Create {
        /// Datasource payload as JSON, or @file
        #[arg(long)]
        payload: String,
    },

    /// Test a datasource configuration without saving it
    Test {
        #[arg(long)]
        payload: String,
    },

    /// Update a datasource
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        payload: String,
    },

    /// Show the schema a datasource exposes
    Structure {
        #[arg(long)]
        id: String,
        /// Ask the server to refresh its cached structure
        #[arg(long)]
        ignore_cache: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ActionsCommand {
    /// List the actions of a page
    List {
        #[arg(long)]
        page: String,
    },

    /// Create an action
    Create {
        /// Action payload as JSON, or @file
        #[arg(long)]
        payload: String,
    },

    /// Update an action
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        payload: String,
    },

    /// Execute an action; a payload with a `form` object is sent as multipart
    Execute {
        #[arg(long)]
        payload: String,
    },

    /// Turn run-on-page-load on or off for an action, by name
    SetOnLoad {
        #[arg(long)]
        page: String,
        /// Action name
        #[arg(long)]
        name: String,
        /// Run on page load
        #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
        enabled: bool,
    },
}

pub async fn run_datasources_command(
    api: &AppsmithApi,
    cmd: DatasourcesCommand,
) -> anyhow::Result<Value> {
    let value = match cmd {
        DatasourcesCommand::List { workspace } => api.list_datasources(&workspace).await?,
        DatasourcesCommand::Create { payload } => {
            api.create_datasource(parse_json_arg(&payload)?).await?
        }
        DatasourcesCommand::Test { payload } => {
            api.test_datasource(parse_json_arg(&payload)?).await?
        }
        DatasourcesCommand::Update { id, payload } => {
            api.update_datasource(&id, parse_json_arg(&payload)?)
                .await?
        }
        DatasourcesCommand::Structure { id, ignore_cache } => {
            api.datasource_structure(&id, ignore_cache).await?
        }
    };
    Ok(value)
}

pub async fn run_actions_command(api: &AppsmithApi, cmd: ActionsCommand) -> anyhow::Result<Value> {
    let value = match cmd {
        ActionsCommand::List { page } => api.list_actions(&page).await?,
        ActionsCommand::Create { payload } => api.create_action(parse_json_arg(&payload)?).await?,
        ActionsCommand::Update { id, payload } => {
            api.update_action(&id, parse_json_arg(&payload)?).await?
        }
        ActionsCommand::Execute { payload } => {
            api.execute_action(parse_json_arg(&payload)?).await?
        }
        ActionsCommand::SetOnLoad {
            page,
            name,
            enabled,
        } => api.set_execute_on_load(&page, &name, enabled).await?,
    };
    Ok(value)
}
