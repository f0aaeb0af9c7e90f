//! Error types for appsmith-ops.
//!
//! None of these are retried internally. A caller that wants to treat 4xx
//! and 5xx responses differently can inspect [`ApiError`] directly.

use thiserror::Error;

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for session, API and editing operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Login did not establish an authenticated identity.
    #[error("Authentication failed: {reason}")]
    Auth {
        /// Why the identity is still anonymous.
        reason: String,
    },

    /// The server did not hand out a token or cookie we depend on.
    #[error("Protocol error: {reason}")]
    Protocol {
        /// What was expected and not found.
        reason: String,
    },

    /// Non-success HTTP response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Malformed widget spec or page tree.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport failure, including per-request timeouts.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors, raised at the boundary while building [`crate::config::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// An HTTP response with status >= 400.
#[derive(Debug, Clone, Error)]
#[error("Appsmith API {method} {path} failed: HTTP {status}\n{body_preview}")]
pub struct ApiError {
    /// Upper-case HTTP method.
    pub method: String,
    /// Request path, relative to the origin.
    pub path: String,
    /// Response status code.
    pub status: u16,
    /// Response body, truncated.
    pub body_preview: String,
}

impl ApiError {
    /// 4xx: the request itself was wrong.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// 5xx: the server failed.
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

/// Errors in the widget tree or in caller-supplied widget specs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("DSL root missing widgetId (cannot set parentId for new widgets)")]
    RootWithoutId,

    #[error("Widget spec missing widgetName")]
    MissingName,

    #[error("Widget {widget_name} missing type")]
    MissingType { widget_name: String },

    #[error("Widget {widget_name} has unknown type '{widget_type}'")]
    UnknownType {
        widget_name: String,
        widget_type: String,
    },

    #[error(
        "AutoLayout detected (layoutSystemType={layout_system}). Widget upserts support only FIXED layout"
    )]
    AutoLayout { layout_system: String },

    #[error("Page {page_id} has no layout{detail}")]
    NoLayout { page_id: String, detail: String },

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("Cannot set '{key}' on widget {widget_name}: {reason}")]
    InvalidProperty {
        widget_name: String,
        key: String,
        reason: String,
    },

    #[error("Identifier to replace must not be empty")]
    EmptyIdentifier,

    #[error("Identifier '{identifier}' cannot be matched: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("Widget '{widget_name}' not found")]
    WidgetNotFound { widget_name: String },

    #[error("Action '{action_name}' not found on page {page_id}")]
    ActionNotFound {
        action_name: String,
        page_id: String,
    },
}
