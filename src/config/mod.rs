//! Configuration, resolved once at the process boundary.
//!
//! Sources, highest priority first:
//! - process environment (including anything `dotenvy` loaded from `.env`)
//! - the `KEY: value` secrets file (`APPSMITH_SECRETS_FILE`, default
//!   `MEUS_SEGREDOS.txt` in the working directory)
//!
//! Library code never reads the environment; it receives [`AppsmithConfig`]
//! by value.

mod appsmith;
pub(crate) mod helpers;
pub mod secrets_file;

use std::path::Path;

pub use appsmith::{AppsmithConfig, Credentials, DEFAULT_TIMEOUT_MS};
pub use helpers::EnvSource;

use crate::error::ConfigError;

/// Full configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub appsmith: AppsmithConfig,
}

impl Config {
    /// Load `.env`, overlay the secrets file, then resolve.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let process = EnvSource::process();
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Unreadable {
            path: ".".to_string(),
            reason: e.to_string(),
        })?;
        let override_path = process.optional_env("APPSMITH_SECRETS_FILE")?;
        let path = secrets_file::secrets_file_path(override_path.as_deref(), &cwd);

        Self::from_sources(process, &path)
    }

    /// Resolve from an explicit source plus a secrets file path.
    pub fn from_sources(env: EnvSource, secrets_path: &Path) -> Result<Self, ConfigError> {
        let entries = secrets_file::load_secrets_file(secrets_path)?;
        Self::resolve(&env.with_overlay(entries))
    }

    pub fn resolve(env: &EnvSource) -> Result<Self, ConfigError> {
        Ok(Self {
            appsmith: AppsmithConfig::resolve(env)?,
        })
    }
}
