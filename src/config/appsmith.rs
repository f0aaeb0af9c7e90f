use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::config::helpers::EnvSource;
use crate::error::ConfigError;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Identifier + secret pair used for form login.
#[derive(Clone)]
pub struct Credentials {
    pub identifier: String,
    pub secret: SecretString,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: SecretString::from(secret.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Connection settings for one Appsmith server.
#[derive(Debug, Clone)]
pub struct AppsmithConfig {
    /// Scheme, host and port only. All request paths resolve against it.
    pub origin: Url,
    /// Login credentials, if any were configured.
    pub credentials: Option<Credentials>,
    /// Per-request deadline.
    pub timeout: Duration,
    /// User-Agent header sent on every request.
    pub user_agent: String,
}

impl AppsmithConfig {
    /// Build a config from a base URL. Any path or query on `base_url` is dropped.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            origin: origin_of(base_url)?,
            credentials: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            user_agent: default_user_agent(),
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn resolve(env: &EnvSource) -> Result<Self, ConfigError> {
        let base_url = env
            .optional_env("APPSMITH_URL")?
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "APPSMITH_URL".to_string(),
                hint: "Set APPSMITH_URL in the environment or the secrets file".to_string(),
            })?;

        let email = env.optional_env("APPSMITH_EMAIL")?;
        let password = env.optional_env("APPSMITH_PASSWORD")?;
        let credentials = match (email, password) {
            (Some(identifier), Some(secret)) => Some(Credentials::new(identifier, secret)),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "Only one of APPSMITH_EMAIL / APPSMITH_PASSWORD is set; login will be unavailable"
                );
                None
            }
            (None, None) => None,
        };

        let timeout_ms = env.parse_optional_env("APPSMITH_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "APPSMITH_TIMEOUT_MS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            origin: origin_of(&base_url)?,
            credentials,
            timeout: Duration::from_millis(timeout_ms),
            user_agent: default_user_agent(),
        })
    }
}

fn default_user_agent() -> String {
    format!("appsmith-ops/{}", env!("CARGO_PKG_VERSION"))
}

fn origin_of(base_url: &str) -> Result<Url, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: "APPSMITH_URL".to_string(),
        message,
    };

    let parsed = Url::parse(base_url.trim()).map_err(|e| invalid(format!("invalid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "unsupported scheme '{}', expected http or https",
            parsed.scheme()
        )));
    }

    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(invalid("URL has no host".to_string()));
    }
    Url::parse(&origin.ascii_serialization()).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_origin_strips_path_and_query() {
        let config = AppsmithConfig::new("https://apps.example.com:8443/app/edit?x=1").unwrap();
        assert_eq!(config.origin.as_str(), "https://apps.example.com:8443/");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = AppsmithConfig::new("ftp://apps.example.com").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_resolve_requires_url() {
        let env = EnvSource::isolated(Vec::<(String, String)>::new());
        let err = AppsmithConfig::resolve(&env).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "APPSMITH_URL")
        );
    }

    #[test]
    fn test_resolve_reads_credentials_and_timeout() {
        let env = EnvSource::isolated([
            ("APPSMITH_URL", "http://127.0.0.1:8080"),
            ("APPSMITH_EMAIL", "ops@example.com"),
            ("APPSMITH_PASSWORD", "hunter2"),
            ("APPSMITH_TIMEOUT_MS", "1200"),
        ]);
        let config = AppsmithConfig::resolve(&env).unwrap();
        let creds = config.credentials.as_ref().unwrap();
        assert_eq!(creds.identifier, "ops@example.com");
        assert_eq!(creds.secret.expose_secret(), "hunter2");
        assert_eq!(config.timeout, Duration::from_millis(1200));
    }

    #[test]
    fn test_partial_credentials_are_ignored() {
        let env = EnvSource::isolated([
            ("APPSMITH_URL", "http://127.0.0.1:8080"),
            ("APPSMITH_EMAIL", "ops@example.com"),
        ]);
        let config = AppsmithConfig::resolve(&env).unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let env = EnvSource::isolated([
            ("APPSMITH_URL", "http://127.0.0.1:8080"),
            ("APPSMITH_TIMEOUT_MS", "0"),
        ]);
        assert!(AppsmithConfig::resolve(&env).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("a@b.c", "topsecret");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("topsecret"));
    }
}
