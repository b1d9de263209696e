// crates/warbler-web/src/routes/home.rs
// ============================================================================
// Module: Home Route
// Description: Timeline for logged-in users, landing page otherwise.
// Purpose: Render `/`.
// Dependencies: axum, tera, warbler-core
// ============================================================================

use axum::response::Response;
use tera::Context;

use crate::context::RequestContext;
use crate::error::WebError;
use crate::templates::MessageView;

/// `GET /`: timeline of the viewer and the users they follow, newest first.
///
/// # Errors
///
/// Returns [`WebError`] when the store or template rendering fails.
pub async fn homepage(ctx: RequestContext) -> Result<Response, WebError> {
    let Some(viewer) = ctx.user_id() else {
        return ctx.render("home-anon.html", Context::new());
    };
    let store = &ctx.state().store;
    let feed = store.timeline(viewer, ctx.state().config.app.timeline_limit)?;
    let liked = store.liked_message_ids(viewer)?;
    let stats = store.user_stats(viewer)?;
    let messages: Vec<MessageView> =
        feed.iter().map(|item| MessageView::from_feed(item, Some(viewer), &liked)).collect();

    let mut context = Context::new();
    context.insert("messages", &messages);
    context.insert("stats", &stats);
    ctx.render("home.html", context)
}
