//! CLI command handling.
//!
//! Provides subcommands for:
//! - Session checks (`health`, `whoami`, `login`)
//! - Browsing workspaces and applications (`workspaces`, `apps`)
//! - Moving applications around (`export`, `import`, `publish`)
//! - Page and layout edits (`pages`, `layout`, `widgets`, `refs`)
//! - Datasources and actions (`datasources`, `actions`)
//! - Shell completions (`completion`)

mod completion;
mod pages;
mod resources;

pub use completion::Completion;
pub use pages::{LayoutCommand, PagesCommand, RefsCommand, WidgetsCommand};
pub use resources::{ActionsCommand, DatasourcesCommand};

use std::path::PathBuf;

use anyhow::Context;
use clap::{ColorChoice, Parser, Subcommand};
use serde_json::Value;

use crate::appsmith::AppsmithApi;

/// Default directory for `export` output.
pub const DEFAULT_EXPORT_DIR: &str = "tmp/appsmith/exports";

#[derive(Parser, Debug)]
#[command(name = "appsmith-ops")]
#[command(about = "Drive an Appsmith server: sessions, exports, and idempotent page edits")]
#[command(
    long_about = "appsmith-ops talks to one Appsmith server configured through APPSMITH_URL, APPSMITH_EMAIL and APPSMITH_PASSWORD (environment, .env or the secrets file).\nExamples:\n  appsmith-ops whoami\n  appsmith-ops widgets upsert --app APP --page PAGE --widgets @widgets.json --publish"
)]
#[command(version)]
#[command(color = ColorChoice::Auto)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check server health
    #[command(about = "GET /api/v1/health")]
    Health,

    /// Show the current identity, anonymous or not
    #[command(about = "GET /api/v1/users/me")]
    Whoami,

    /// Log in with the configured credentials
    #[command(
        about = "Log in and print the identity",
        long_about = "Form login with APPSMITH_EMAIL / APPSMITH_PASSWORD, verified by a fresh identity probe.\nExample: appsmith-ops login"
    )]
    Login,

    /// List workspaces
    Workspaces,

    /// List applications of a workspace
    Apps {
        /// Workspace id
        #[arg(long)]
        workspace: String,
    },

    /// Export an application to a file
    #[command(
        about = "Export an application",
        long_about = "Downloads an application export and writes it as JSON or zip.\nExample: appsmith-ops export --app 64f0c1 --out tmp/exports"
    )]
    Export {
        /// Application id
        #[arg(long)]
        app: String,

        /// Git branch to export
        #[arg(long)]
        branch: Option<String>,

        /// Output directory
        #[arg(long, default_value = DEFAULT_EXPORT_DIR)]
        out: PathBuf,
    },

    /// Import an application export into a workspace
    Import {
        /// Workspace id
        #[arg(long)]
        workspace: String,

        /// Export file to upload
        #[arg(long)]
        file: PathBuf,

        /// Replace this existing application instead of creating a new one
        #[arg(long)]
        replace_app: Option<String>,
    },

    /// Publish an application
    Publish {
        /// Application id
        #[arg(long)]
        app: String,
    },

    /// List, fetch or ensure pages
    #[command(subcommand)]
    Pages(PagesCommand),

    /// Save or inspect page layouts
    #[command(subcommand)]
    Layout(LayoutCommand),

    /// Find or upsert widgets
    #[command(subcommand)]
    Widgets(WidgetsCommand),

    /// Rewrite references inside a page
    #[command(subcommand)]
    Refs(RefsCommand),

    /// Manage datasources
    #[command(subcommand)]
    Datasources(DatasourcesCommand),

    /// Manage and run actions
    #[command(subcommand)]
    Actions(ActionsCommand),

    /// Generate shell completion scripts
    #[command(
        about = "Generate completions",
        long_about = "Generates shell completion scripts.\nExample: appsmith-ops completion --shell bash > appsmith-ops.bash"
    )]
    Completion(Completion),
}

/// Run one server command and return its JSON result.
pub async fn run_command(api: &AppsmithApi, command: Command) -> anyhow::Result<Value> {
    let session = api.session();
    let value = match command {
        Command::Health => session.health().await?,
        Command::Whoami => session.whoami().await?,
        Command::Login => session.login().await?,
        Command::Workspaces => api.list_workspaces().await?,
        Command::Apps { workspace } => api.list_apps(&workspace).await?,
        Command::Export { app, branch, out } => {
            let export = api.export_app(&app, branch.as_deref()).await?;
            let saved = export
                .save_to(&out)
                .await
                .with_context(|| format!("writing export into {}", out.display()))?;
            serde_json::to_value(saved)?
        }
        Command::Import {
            workspace,
            file,
            replace_app,
        } => {
            api.import_app(&workspace, &file, replace_app.as_deref())
                .await?
        }
        Command::Publish { app } => api.publish(&app).await?,
        Command::Pages(cmd) => pages::run_pages_command(api, cmd).await?,
        Command::Layout(cmd) => pages::run_layout_command(api, cmd).await?,
        Command::Widgets(cmd) => pages::run_widgets_command(api, cmd).await?,
        Command::Refs(cmd) => pages::run_refs_command(api, cmd).await?,
        Command::Datasources(cmd) => resources::run_datasources_command(api, cmd).await?,
        Command::Actions(cmd) => resources::run_actions_command(api, cmd).await?,
        Command::Completion(_) => anyhow::bail!("completion does not talk to the server"),
    };
    Ok(value)
}

/// Parse a JSON argument. `@path` reads the JSON from a file.
pub fn parse_json_arg(raw: &str) -> anyhow::Result<Value> {
    match raw.strip_prefix('@') {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading JSON from {path}"))?;
            serde_json::from_str(text.trim_start_matches('\u{feff}'))
                .with_context(|| format!("parsing JSON from {path}"))
        }
        None => serde_json::from_str(raw).context("parsing inline JSON argument"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_version() {
        let cmd = Cli::command();
        assert_eq!(
            cmd.get_version().unwrap_or("unknown"),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_mentions_subcommands() {
        let mut cmd = Cli::command();
        let help = cmd.render_help().to_string();
        for name in ["whoami", "widgets", "layout", "completion"] {
            assert!(help.contains(name), "help is missing {name}");
        }
    }

    #[test]
    fn test_parses_widget_upsert() {
        let cli = Cli::try_parse_from([
            "appsmith-ops",
            "widgets",
            "upsert",
            "--app",
            "a1",
            "--page",
            "p1",
            "--widgets",
            "[]",
            "--publish",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Widgets(WidgetsCommand::Upsert { publish: true, .. })
        ));
    }

    #[test]
    fn test_parses_widget_shift_with_negative_delta() {
        let cli = Cli::try_parse_from([
            "appsmith-ops",
            "widgets",
            "shift",
            "--app",
            "a1",
            "--page",
            "p1",
            "--names",
            "Txt_A,Txt_B",
            "--delta",
            "-2",
        ])
        .unwrap();
        let Command::Widgets(WidgetsCommand::Shift { names, delta, .. }) = cli.command else {
            panic!("expected widgets shift");
        };
        assert_eq!(names, vec!["Txt_A".to_string(), "Txt_B".to_string()]);
        assert_eq!(delta, -2.0);
    }

    #[test]
    fn test_json_arg_inline_and_file() {
        assert_eq!(parse_json_arg("{\"a\":1}").unwrap()["a"], 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.json");
        std::fs::write(&path, "\u{feff}[1, 2]").unwrap();
        let value = parse_json_arg(&format!("@{}", path.display())).unwrap();
        assert_eq!(value, serde_json::json!([1, 2]));

        assert!(parse_json_arg("not json").is_err());
    }
}
