//! Fetch, edit, save and optionally publish one page layout.
//!
//! Steps run strictly in sequence and any failure aborts the rest; in
//! particular a failed save never publishes.

use serde_json::Value;

use crate::appsmith::api::AppsmithApi;
use crate::appsmith::types::{LayoutSave, PageEditOutcome, PageLayout, PageTarget, select_layout};
use crate::dsl::{self, WidgetSpec};
use crate::error::Result;
use crate::util::body_preview;

/// Longest save response kept in a [`PageEditOutcome`].
pub const SAVE_PREVIEW_CHARS: usize = 800;

struct Saved {
    preview: String,
    published: bool,
}

async fn save_and_publish(
    api: &AppsmithApi,
    target: &PageTarget,
    layout: &PageLayout,
    save: LayoutSave,
    publish: bool,
) -> Result<Saved> {
    let response = api.save_layout(target, &layout.layout_id, &save).await?;
    let preview = body_preview(&response, SAVE_PREVIEW_CHARS);
    if publish {
        api.publish(&target.application_id).await?;
    }
    Ok(Saved {
        preview,
        published: publish,
    })
}

fn outcome(layout: &PageLayout, saved: Saved) -> PageEditOutcome {
    PageEditOutcome {
        page_id: layout.page_id.clone(),
        layout_id: layout.layout_id.clone(),
        report: None,
        replacements: None,
        shifted: None,
        save_preview: saved.preview,
        published: saved.published,
    }
}

/// Upsert widgets by name into a fixed-layout page and save the full tree.
///
/// Responsive pages are rejected before the tree is touched.
pub async fn upsert_widgets(
    api: &AppsmithApi,
    target: &PageTarget,
    specs: &[WidgetSpec],
    publish: bool,
) -> Result<PageEditOutcome> {
    let mut layout = api
        .fetch_layout(&target.page_id, target.layout_id.as_deref())
        .await?;
    layout.layout_system.ensure_fixed()?;

    let report = dsl::upsert(&mut layout.dsl, specs)?;
    tracing::info!(
        page_id = %layout.page_id,
        created = report.created.len(),
        updated = report.updated.len(),
        "Upserted widgets"
    );

    let save = LayoutSave::dsl(layout.dsl.to_value()?);
    let saved = save_and_publish(api, target, &layout, save, publish).await?;
    Ok(PageEditOutcome {
        report: Some(report),
        ..outcome(&layout, saved)
    })
}

/// Rename an action everywhere it is referenced in a page and save.
pub async fn replace_action_refs(
    api: &AppsmithApi,
    target: &PageTarget,
    from: &str,
    to: &str,
    publish: bool,
) -> Result<PageEditOutcome> {
    let mut layout = api
        .fetch_layout(&target.page_id, target.layout_id.as_deref())
        .await?;

    let replacements = dsl::replace_identifier(&mut layout.dsl, from, to)?;
    tracing::info!(page_id = %layout.page_id, from, to, replacements, "Replaced action references");

    let save = LayoutSave::dsl(layout.dsl.to_value()?);
    let saved = save_and_publish(api, target, &layout, save, publish).await?;
    Ok(PageEditOutcome {
        replacements: Some(replacements),
        ..outcome(&layout, saved)
    })
}

/// Move the named widgets down by `delta` rows (up when negative) and save.
///
/// Names missing from the page are skipped; the outcome lists the ones moved.
pub async fn shift_widgets(
    api: &AppsmithApi,
    target: &PageTarget,
    names: &[String],
    delta: f64,
    publish: bool,
) -> Result<PageEditOutcome> {
    let mut layout = api
        .fetch_layout(&target.page_id, target.layout_id.as_deref())
        .await?;
    layout.layout_system.ensure_fixed()?;

    let shifted = dsl::shift_rows(&mut layout.dsl, names, delta);
    tracing::info!(page_id = %layout.page_id, delta, moved = shifted.len(), "Shifted widgets");

    let save = LayoutSave::dsl(layout.dsl.to_value()?);
    let saved = save_and_publish(api, target, &layout, save, publish).await?;
    Ok(PageEditOutcome {
        shifted: Some(shifted),
        ..outcome(&layout, saved)
    })
}

/// Save the page unchanged with an empty on-load action plan.
///
/// Some Appsmith versions rebuild the plan from each action's
/// `executeOnLoad`, so this may need [`AppsmithApi::set_execute_on_load`] too.
pub async fn clear_on_load_actions(
    api: &AppsmithApi,
    target: &PageTarget,
    publish: bool,
) -> Result<PageEditOutcome> {
    let layout = api
        .fetch_layout(&target.page_id, target.layout_id.as_deref())
        .await?;
    let save = LayoutSave::clearing_on_load(layout.dsl.to_value()?);
    let saved = save_and_publish(api, target, &layout, save, publish).await?;
    Ok(outcome(&layout, saved))
}

/// Sorted field names of the raw layout object, plus its current on-load
/// plan, to see which layout fields the server exposes.
pub async fn layout_keys(api: &AppsmithApi, target: &PageTarget) -> Result<Value> {
    let page = api.fetch_page(&target.page_id, false).await?;
    let (layout, layout_id) = select_layout(&target.page_id, &page, target.layout_id.as_deref())?;

    let mut keys: Vec<&String> = layout
        .as_object()
        .map(|fields| fields.keys().collect())
        .unwrap_or_default();
    keys.sort();

    Ok(serde_json::json!({
        "pageId": target.page_id,
        "layoutId": layout_id,
        "keys": keys,
        "layoutOnLoadActions": layout.get("layoutOnLoadActions").cloned().unwrap_or(Value::Null),
    }))
}
