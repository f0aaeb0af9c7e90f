use std::collections::HashMap;

use crate::error::ConfigError;

/// Where configuration values are read from.
///
/// Process environment wins; the overlay (typically parsed from a secrets
/// file) only fills keys the environment does not set.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    read_process: bool,
    overlay: HashMap<String, String>,
}

impl EnvSource {
    /// Read from the process environment only.
    pub fn process() -> Self {
        Self {
            read_process: true,
            overlay: HashMap::new(),
        }
    }

    /// Read only from the given pairs, ignoring the process environment.
    pub fn isolated<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            read_process: false,
            overlay: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Add entries that apply when the process environment lacks them.
    pub fn with_overlay(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        for (k, v) in pairs {
            self.overlay.entry(k).or_insert(v);
        }
        self
    }

    /// Look up a key. Empty values count as unset.
    pub fn optional_env(&self, key: &str) -> Result<Option<String>, ConfigError> {
        if self.read_process {
            match std::env::var(key) {
                Ok(val) if !val.trim().is_empty() => return Ok(Some(val)),
                Ok(_) | Err(std::env::VarError::NotPresent) => {}
                Err(std::env::VarError::NotUnicode(_)) => {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: "value is not valid UTF-8".to_string(),
                    });
                }
            }
        }

        Ok(self
            .overlay
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned())
    }

    /// Parse a key with `FromStr`, falling back to `default` when unset.
    pub fn parse_optional_env<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional_env(key)? {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            }),
            None => Ok(default),
        }
    }
}
