//! Page DSL model and the in-memory editor.

pub mod editor;
mod kind;
pub mod layout;
pub mod refs;
mod spec;
mod widget;

pub use editor::{
    all_widget_ids, apply_props_and_bindings, find_by_name, find_by_name_mut, find_first_by_type,
    shift_rows, upsert,
};
pub use kind::WidgetKind;
pub use layout::LayoutSystem;
pub use refs::replace_identifier;
pub use spec::{EdgeSpec, ReportEntry, UpsertReport, WidgetSpec};
pub use widget::{Edges, PathKey, Position, PositionScheme, WidgetNode};
