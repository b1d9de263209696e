// crates/warbler-web/src/routes/messages.rs
// ============================================================================
// Module: Message Routes
// Description: Compose, show, and delete messages.
// Purpose: Serve every `/messages` page and action.
// Dependencies: axum, tera, validator, warbler-core
// ============================================================================

use axum::Form;
use axum::extract::Path;
use axum::response::Response;
use tera::Context;
use validator::Validate;
use warbler_core::MessageId;
use warbler_core::NewMessage;

use crate::context::RequestContext;
use crate::error::WebError;
use crate::forms::MessageForm;
use crate::forms::error_messages;
use crate::routes::auth::CSRF_REJECTED;
use crate::routes::parse_id;
use crate::session::FlashCategory;
use crate::templates::MessageView;

/// `GET /messages/new`.
///
/// # Errors
///
/// Returns [`WebError`] when rendering fails.
pub async fn new_message_page(ctx: RequestContext) -> Result<Response, WebError> {
    if ctx.current_user().is_none() {
        return ctx.unauthorized();
    }
    render_new(ctx, &MessageForm::default(), &[])
}

/// `POST /messages/new`: posts a message and redirects to the author's page.
///
/// # Errors
///
/// Returns [`WebError`] when the store or rendering fails.
pub async fn create_message(
    mut ctx: RequestContext,
    Form(form): Form<MessageForm>,
) -> Result<Response, WebError> {
    let Some(author) = ctx.user_id() else {
        return ctx.unauthorized();
    };
    if !ctx.csrf_valid(&form.csrf_token) {
        ctx.flash(FlashCategory::Danger, CSRF_REJECTED);
        return render_new(ctx, &form, &[]);
    }
    if let Err(errors) = form.validate() {
        return render_new(ctx, &form, &error_messages(&errors));
    }
    let message =
        ctx.state().store.create_message(&NewMessage { user_id: author, text: form.text })?;
    tracing::debug!(user_id = %author, message_id = %message.id, "message posted");
    ctx.redirect(&format!("/users/{author}"))
}

/// `GET /messages/{id}`.
///
/// # Errors
///
/// Returns [`WebError::NotFound`] for unknown or malformed ids.
pub async fn show_message(
    ctx: RequestContext,
    Path(raw): Path<String>,
) -> Result<Response, WebError> {
    let id: MessageId = parse_id(&raw)?;
    let store = &ctx.state().store;
    let message = store.message(id)?.ok_or(WebError::NotFound)?;
    let author = store.user(message.user_id)?.ok_or(WebError::NotFound)?;
    let viewer = ctx.user_id();
    let liked = match viewer {
        Some(viewer) => store.liked_message_ids(viewer)?,
        None => Vec::new(),
    };
    let mut context = Context::new();
    context.insert("message", &MessageView::from_message(&message, &author, viewer, &liked));
    context.insert("likes", &store.likes_for_message(id)?.len());
    ctx.render("messages/show.html", context)
}

/// `POST /messages/{id}/delete`: only the author may delete a message.
///
/// # Errors
///
/// Returns [`WebError::NotFound`] for unknown or malformed ids.
pub async fn delete_message(
    ctx: RequestContext,
    Path(raw): Path<String>,
) -> Result<Response, WebError> {
    let Some(viewer) = ctx.user_id() else {
        return ctx.unauthorized();
    };
    let id: MessageId = parse_id(&raw)?;
    let message = ctx.state().store.message(id)?.ok_or(WebError::NotFound)?;
    if message.user_id != viewer {
        tracing::info!(
            user_id = %viewer,
            message_id = %id,
            "refused delete of another user's message"
        );
        return ctx.unauthorized();
    }
    ctx.state().store.delete_message(id)?;
    ctx.redirect(&format!("/users/{viewer}"))
}

/// Renders the compose form.
fn render_new(
    ctx: RequestContext,
    form: &MessageForm,
    errors: &[String],
) -> Result<Response, WebError> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    ctx.render("messages/new.html", context)
}
