//! appsmith-ops - main entry point.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use appsmith_ops::{
    appsmith::{AppsmithApi, SessionClient},
    cli::{Cli, Command, run_command},
    config::Config,
};

fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("appsmith_ops=info"));

    // stdout carries the command result; logs go to stderr.
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Command::Completion(completion) = &cli.command {
        return completion.run();
    }

    init_tracing(cli.log_json);

    let config = Config::from_env()?;
    tracing::debug!(origin = %config.appsmith.origin, "Loaded configuration");

    let api = AppsmithApi::new(SessionClient::new(config.appsmith)?);
    let output = run_command(&api, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
