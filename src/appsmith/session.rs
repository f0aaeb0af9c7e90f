//! Cookie-backed, XSRF-signed session against one Appsmith origin.
//!
//! The session never caches whether it is logged in. Callers that need an
//! identity go through [`SessionClient::ensure_logged_in`], which probes
//! `/api/v1/users/me` and logs in only when the probe comes back anonymous.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::AppsmithConfig;
use crate::error::{ApiError, ConfigError, Error, Result};
use crate::util::body_preview;

/// Cookie the server hands out for anti-forgery protection.
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
/// Header the cookie value is echoed in on writes.
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Longest error body kept in an [`ApiError`].
pub const ERROR_PREVIEW_CHARS: usize = 1500;

const USERS_ME: &str = "/api/v1/users/me";
const LOGIN: &str = "/api/v1/login";
const HEALTH: &str = "/api/v1/health";

/// Request payload.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    None,
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    Multipart(reqwest::multipart::Form),
}

/// Per-request options for [`SessionClient::request`].
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter only when `value` is set.
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }
}

/// A successful (status < 400) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON; a non-JSON body becomes a string, an empty one `null`.
    pub body: Value,
    /// Raw body as received.
    pub bytes: Bytes,
}

impl ApiResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }
}

/// True unless the probe payload carries an explicit `isAnonymous: false`.
///
/// The flag is read from `data.isAnonymous`, falling back to a top-level
/// `isAnonymous`. Anything that is not a boolean counts as anonymous.
pub fn is_anonymous(who: &Value) -> bool {
    let flag = who
        .get("data")
        .and_then(|d| d.get("isAnonymous"))
        .filter(|v| !v.is_null())
        .or_else(|| who.get("isAnonymous"));
    flag.and_then(Value::as_bool).unwrap_or(true)
}

fn requires_xsrf(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Value of cookie `name` in a `k=v; k2=v2` header.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}

fn parse_body(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// HTTP session for one Appsmith server.
pub struct SessionClient {
    config: AppsmithConfig,
    http: Client,
    jar: Arc<Jar>,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("origin", &self.config.origin.as_str())
            .field("has_credentials", &self.config.credentials.is_some())
            .finish()
    }
}

impl SessionClient {
    /// Build a session with an empty cookie jar.
    pub fn new(config: AppsmithConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );

        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(default_headers)
            .build()?;

        Ok(Self { config, http, jar })
    }

    pub fn config(&self) -> &AppsmithConfig {
        &self.config
    }

    /// Current anti-forgery token, if the jar holds one.
    pub fn xsrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.config.origin)?;
        let header = header.to_str().ok()?;
        cookie_value(header, XSRF_COOKIE)
    }

    /// Return the anti-forgery token, probing `/api/v1/users/me` once if the
    /// jar does not have one yet.
    pub async fn ensure_token(&self) -> Result<String> {
        if let Some(token) = self.xsrf_token() {
            return Ok(token);
        }
        self.dispatch(Method::GET, USERS_ME, RequestOptions::new())
            .await?;
        self.xsrf_token().ok_or_else(|| Error::Protocol {
            reason: format!("{XSRF_COOKIE} cookie not found after GET {USERS_ME}"),
        })
    }

    /// Send one request. Writes carry the anti-forgery header; a status of
    /// 400 or more becomes [`ApiError`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        mut options: RequestOptions,
    ) -> Result<ApiResponse> {
        if requires_xsrf(&method) {
            let token = self.ensure_token().await?;
            let value = HeaderValue::from_str(&token).map_err(|e| Error::Protocol {
                reason: format!("{XSRF_COOKIE} is not a valid header value: {e}"),
            })?;
            options
                .headers
                .insert(HeaderName::from_static("x-xsrf-token"), value);
        }
        self.dispatch(method, path, options).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let url = self
            .config
            .origin
            .join(path)
            .map_err(|e| ConfigError::InvalidValue {
                key: "path".to_string(),
                message: format!("cannot join '{path}' onto {}: {e}", self.config.origin),
            })?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .headers(options.headers);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        request = match options.body {
            RequestBody::None => request,
            RequestBody::Json(body) => request.json(&body),
            RequestBody::Form(fields) => request.form(&fields),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        let body = parse_body(&bytes);

        tracing::debug!(method = %method, path, status = status.as_u16(), "Appsmith request");

        if status.as_u16() >= 400 {
            let err = ApiError {
                method: method.as_str().to_uppercase(),
                path: path.to_string(),
                status: status.as_u16(),
                body_preview: body_preview(&body, ERROR_PREVIEW_CHARS),
            };
            if err.is_server_error() {
                tracing::warn!(method = %method, path, status = err.status, "Appsmith server error");
            }
            return Err(err.into());
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
            bytes,
        })
    }

    /// `GET /api/v1/health`
    pub async fn health(&self) -> Result<Value> {
        Ok(self
            .request(Method::GET, HEALTH, RequestOptions::new())
            .await?
            .body)
    }

    /// Identity payload. Anonymous sessions get one too.
    pub async fn whoami(&self) -> Result<Value> {
        Ok(self
            .request(Method::GET, USERS_ME, RequestOptions::new())
            .await?
            .body)
    }

    /// Form login with explicit credentials, verified by a fresh probe.
    pub async fn login_with(&self, identifier: &str, secret: &SecretString) -> Result<Value> {
        self.ensure_token().await?;
        let form = vec![
            ("username".to_string(), identifier.to_string()),
            ("password".to_string(), secret.expose_secret().to_string()),
        ];
        self.request(Method::POST, LOGIN, RequestOptions::new().form(form))
            .await?;

        let who = self.whoami().await?;
        if is_anonymous(&who) {
            return Err(Error::Auth {
                reason: format!("still anonymous after {LOGIN}"),
            });
        }
        tracing::info!(identifier, "Logged in to Appsmith");
        Ok(who)
    }

    /// Log in with the configured credentials.
    pub async fn login(&self) -> Result<Value> {
        let credentials = self.config.credentials.as_ref().ok_or_else(|| {
            ConfigError::MissingRequired {
                key: "APPSMITH_EMAIL/APPSMITH_PASSWORD".to_string(),
                hint: "Set both in the environment or the secrets file".to_string(),
            }
        })?;
        self.login_with(&credentials.identifier, &credentials.secret)
            .await
    }

    /// Probe the session and log in only if it is anonymous.
    pub async fn ensure_logged_in(&self) -> Result<Value> {
        let who = self.whoami().await?;
        if !is_anonymous(&who) {
            return Ok(who);
        }
        tracing::debug!("Session is anonymous, logging in");
        self.login().await
    }
}
