// crates/warbler-web/src/routes/users.rs
// ============================================================================
// Module: User Routes
// Description: User listing, profiles, follows, likes, and account edits.
// Purpose: Serve every `/users` page and action.
// Dependencies: axum, tera, validator, warbler-core
// ============================================================================

//! ## Overview
//! Profile pages are public. Follow lists, likes, follow actions, profile
//! edits, and account deletion require a logged-in user; anonymous requests
//! are redirected home with "Access unauthorized." before any lookup runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Form;
use axum::extract::Path;
use axum::extract::Query;
use axum::response::Response;
use tera::Context;
use validator::Validate;
use warbler_core::MessageId;
use warbler_core::ProfileUpdate;
use warbler_core::StoreError;
use warbler_core::User;
use warbler_core::UserId;
use warbler_core::accounts::authenticate;

use crate::context::RequestContext;
use crate::error::WebError;
use crate::forms::EditProfileForm;
use crate::forms::SearchQuery;
use crate::forms::error_messages;
use crate::routes::auth::CSRF_REJECTED;
use crate::routes::parse_id;
use crate::routes::run_blocking;
use crate::session::FlashCategory;
use crate::templates::MessageView;
use crate::templates::UserCard;
use crate::templates::UserView;

// ============================================================================
// SECTION: Listing and Profiles
// ============================================================================

/// `GET /users?q=`: all users, or those whose username contains `q`.
///
/// # Errors
///
/// Returns [`WebError`] when the store or rendering fails.
pub async fn list_users(
    ctx: RequestContext,
    Query(query): Query<SearchQuery>,
) -> Result<Response, WebError> {
    let search = query.q.as_deref().map(str::trim).filter(|term| !term.is_empty());
    let users = ctx.state().store.list_users(search)?;
    let cards = user_cards(&ctx, &users)?;
    let mut context = Context::new();
    context.insert("users", &cards);
    context.insert("q", &search);
    ctx.render("users/index.html", context)
}

/// `GET /users/{id}`: profile with counters and recent messages.
///
/// # Errors
///
/// Returns [`WebError::NotFound`] for unknown users.
pub async fn show_user(ctx: RequestContext, Path(raw): Path<String>) -> Result<Response, WebError> {
    let user = load_user(&ctx, &raw)?;
    let store = &ctx.state().store;
    let messages = store.messages_by_user(user.id, ctx.state().config.app.profile_messages_limit)?;
    let viewer = ctx.user_id();
    let liked = match viewer {
        Some(viewer) => store.liked_message_ids(viewer)?,
        None => Vec::new(),
    };
    let views: Vec<MessageView> = messages
        .iter()
        .map(|message| MessageView::from_message(message, &user, viewer, &liked))
        .collect();
    let mut context = profile_context(&ctx, &user)?;
    context.insert("messages", &views);
    ctx.render("users/show.html", context)
}

/// `GET /users/{id}/following`.
///
/// # Errors
///
/// Returns [`WebError::NotFound`] for unknown users.
pub async fn show_following(
    ctx: RequestContext,
    Path(raw): Path<String>,
) -> Result<Response, WebError> {
    if ctx.current_user().is_none() {
        return ctx.unauthorized();
    }
    let user = load_user(&ctx, &raw)?;
    let following = ctx.state().store.following(user.id)?;
    let mut context = profile_context(&ctx, &user)?;
    context.insert("users", &user_cards(&ctx, &following)?);
    ctx.render("users/following.html", context)
}

/// `GET /users/{id}/followers`.
///
/// # Errors
///
/// Returns [`WebError::NotFound`] for unknown users.
pub async fn show_followers(
    ctx: RequestContext,
    Path(raw): Path<String>,
) -> Result<Response, WebError> {
    if ctx.current_user().is_none() {
        return ctx.unauthorized();
    }
    let user = load_user(&ctx, &raw)?;
    let followers = ctx.state().store.followers(user.id)?;
    let mut context = profile_context(&ctx, &user)?;
    context.insert("users", &user_cards(&ctx, &followers)?);
    ctx.render("users/followers.html", context)
}

/// `GET /users/{id}/likes`: messages the user liked.
///
/// # Errors
///
/// Returns [`WebError::NotFound`] for unknown users.
pub async fn show_likes(ctx: RequestContext, Path(raw): Path<String>) -> Result<Response, WebError> {
    let Some(viewer) = ctx.user_id() else {
        return ctx.unauthorized();
    };
    let user = load_user(&ctx, &raw)?;
    let store = &ctx.state().store;
    let liked_messages =
        store.liked_messages(user.id, ctx.state().config.app.profile_messages_limit)?;
    let viewer_likes = store.liked_message_ids(viewer)?;
    let views: Vec<MessageView> = liked_messages
        .iter()
        .map(|item| MessageView::from_feed(item, Some(viewer), &viewer_likes))
        .collect();
    let mut context = profile_context(&ctx, &user)?;
    context.insert("messages", &views);
    ctx.render("users/likes.html", context)
}

// ============================================================================
// SECTION: Follows
// ============================================================================

/// `POST /users/follow/{id}`.
///
/// # Errors
///
/// Returns [`WebError::NotFound`] for unknown users.
pub async fn follow(mut ctx: RequestContext, Path(raw): Path<String>) -> Result<Response, WebError> {
    let Some(viewer) = ctx.user_id() else {
        return ctx.unauthorized();
    };
    let target = load_user(&ctx, &raw)?;
    match ctx.state().store.follow(viewer, target.id) {
        Ok(()) => tracing::debug!(follower = %viewer, followed = %target.id, "follow added"),
        Err(StoreError::Invalid(_)) => {
            ctx.flash(FlashCategory::Warning, "You cannot follow yourself.");
        }
        Err(error) => return Err(error.into()),
    }
    ctx.redirect(&format!("/users/{viewer}/following"))
}

/// `POST /users/stop-following/{id}`.
///
/// # Errors
///
/// Returns [`WebError::NotFound`] for unknown users.
pub async fn stop_following(
    ctx: RequestContext,
    Path(raw): Path<String>,
) -> Result<Response, WebError> {
    let Some(viewer) = ctx.user_id() else {
        return ctx.unauthorized();
    };
    let target = load_user(&ctx, &raw)?;
    ctx.state().store.unfollow(viewer, target.id)?;
    ctx.redirect(&format!("/users/{viewer}/following"))
}

// ============================================================================
// SECTION: Likes
// ============================================================================

/// `POST /users/add_like/{id}`: toggles the viewer's like on a message.
///
/// # Errors
///
/// Returns [`WebError::NotFound`] for unknown messages and
/// [`WebError::Forbidden`] when liking one's own message.
pub async fn toggle_like(
    ctx: RequestContext,
    Path(raw): Path<String>,
) -> Result<Response, WebError> {
    let Some(viewer) = ctx.user_id() else {
        return ctx.unauthorized();
    };
    let message_id: MessageId = parse_id(&raw)?;
    let store = &ctx.state().store;
    let message = store.message(message_id)?.ok_or(WebError::NotFound)?;
    if message.user_id == viewer {
        return Err(WebError::Forbidden);
    }
    if store.has_liked(viewer, message_id)? {
        store.unlike(viewer, message_id)?;
    } else {
        store.like(viewer, message_id)?;
    }
    ctx.redirect("/")
}

// ============================================================================
// SECTION: Profile Edit and Delete
// ============================================================================

/// `GET /users/profile`.
///
/// # Errors
///
/// Returns [`WebError`] when rendering fails.
pub async fn edit_profile_page(ctx: RequestContext) -> Result<Response, WebError> {
    let Some(user) = ctx.current_user() else {
        return ctx.unauthorized();
    };
    let form = EditProfileForm {
        username: user.username.clone(),
        email: user.email.clone(),
        image_url: user.image_url.clone(),
        header_image_url: user.header_image_url.clone(),
        bio: user.bio.clone().unwrap_or_default(),
        location: user.location.clone().unwrap_or_default(),
        password: String::new(),
        csrf_token: String::new(),
    };
    render_edit(ctx, &form, &[])
}

/// `POST /users/profile`: updates the profile after re-checking the password.
///
/// # Errors
///
/// Returns [`WebError`] when the store, hasher, or rendering fails.
pub async fn edit_profile(
    mut ctx: RequestContext,
    Form(form): Form<EditProfileForm>,
) -> Result<Response, WebError> {
    let Some(user) = ctx.current_user().cloned() else {
        return ctx.unauthorized();
    };
    let form = form.trimmed();
    if !ctx.csrf_valid(&form.csrf_token) {
        ctx.flash(FlashCategory::Danger, CSRF_REJECTED);
        return render_edit(ctx, &form, &[]);
    }
    if let Err(errors) = form.validate() {
        return render_edit(ctx, &form, &error_messages(&errors));
    }
    let state = ctx.state().clone();
    let confirmed = run_blocking(|| {
        authenticate(state.store.as_ref(), state.hasher.as_ref(), &user.username, &form.password)
    })?;
    if confirmed.is_none() {
        tracing::info!(user_id = %user.id, "profile edit rejected: wrong password");
        ctx.flash(FlashCategory::Danger, "Wrong password, please try again.");
        return render_edit(ctx, &form, &[]);
    }
    let update = ProfileUpdate {
        username: form.username.clone(),
        email: form.email.clone(),
        image_url: form.image_url.clone(),
        header_image_url: form.header_image_url.clone(),
        bio: Some(form.bio.clone()),
        location: Some(form.location.clone()),
    };
    match state.store.update_user(user.id, &update) {
        Ok(updated) => {
            tracing::info!(user_id = %updated.id, "profile updated");
            ctx.redirect(&format!("/users/{}", updated.id))
        }
        Err(StoreError::Conflict(_)) => {
            ctx.flash(FlashCategory::Danger, "Username or email already taken");
            render_edit(ctx, &form, &[])
        }
        Err(error) => Err(error.into()),
    }
}

/// `POST /users/delete`: logs out and deletes the account with its content.
///
/// # Errors
///
/// Returns [`WebError`] when the store fails.
pub async fn delete_user(mut ctx: RequestContext) -> Result<Response, WebError> {
    let Some(user_id) = ctx.user_id() else {
        return ctx.unauthorized();
    };
    ctx.logout();
    ctx.state().store.delete_user(user_id)?;
    tracing::info!(user_id = %user_id, "user deleted");
    ctx.redirect("/signup")
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads the user named by a path segment.
fn load_user(ctx: &RequestContext, raw: &str) -> Result<User, WebError> {
    let id: UserId = parse_id(raw)?;
    ctx.state().store.user(id)?.ok_or(WebError::NotFound)
}

/// Builds the shared profile sidebar context for `user`.
fn profile_context(ctx: &RequestContext, user: &User) -> Result<Context, WebError> {
    let store = &ctx.state().store;
    let stats = store.user_stats(user.id)?;
    let viewer_follows = match ctx.user_id() {
        Some(viewer) if viewer != user.id => store.is_following(viewer, user.id)?,
        _ => false,
    };
    let mut context = Context::new();
    context.insert("user", &UserView::from(user));
    context.insert("stats", &stats);
    context.insert("viewer_follows", &viewer_follows);
    Ok(context)
}

/// Builds user cards annotated with the viewer's follow state.
fn user_cards(ctx: &RequestContext, users: &[User]) -> Result<Vec<UserCard>, WebError> {
    let following: Vec<UserId> = match ctx.user_id() {
        Some(viewer) => ctx.state().store.following(viewer)?.iter().map(|user| user.id).collect(),
        None => Vec::new(),
    };
    Ok(users
        .iter()
        .map(|user| UserCard {
            user: UserView::from(user),
            followed_by_viewer: following.contains(&user.id),
        })
        .collect())
}

/// Renders the profile edit form.
fn render_edit(
    ctx: RequestContext,
    form: &EditProfileForm,
    errors: &[String],
) -> Result<Response, WebError> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    ctx.render("users/edit.html", context)
}
