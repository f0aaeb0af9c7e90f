//! appsmith-ops - drive an Appsmith server from code.
//!
//! The crate has two cores:
//! - [`appsmith::SessionClient`]: a cookie-backed, XSRF-signed HTTP session
//!   that logs in on demand.
//! - [`dsl`]: an in-memory, idempotent editor for page widget trees.
//!
//! [`appsmith::AppsmithApi`] wraps the REST endpoints on top of the session,
//! and [`appsmith::page_edit`] ties fetch, edit, save and publish together.

pub mod appsmith;
pub mod cli;
pub mod config;
pub mod dsl;
pub mod error;
pub mod util;

pub use error::{Error, Result};
