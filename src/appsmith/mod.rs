//! Appsmith server access: the session, typed endpoints and page edits.

pub mod api;
pub mod page_edit;
pub mod session;
pub mod types;

pub use api::AppsmithApi;
pub use session::{ApiResponse, RequestBody, RequestOptions, SessionClient, is_anonymous};
pub use types::{
    CreatePageAttempt, CreatePageVariant, CreatedPage, EnsuredPage, ExportFormat, ExportedApp,
    LayoutSave, PageEditOutcome, PageLayout, PageTarget, SavedExport,
};
