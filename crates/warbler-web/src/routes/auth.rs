// crates/warbler-web/src/routes/auth.rs
// ============================================================================
// Module: Auth Routes
// Description: Signup, login, and logout.
// Purpose: Create accounts and manage the session login.
// Dependencies: axum, tera, validator, warbler-core
// ============================================================================

//! ## Overview
//! Signup and login re-render their form with a flash on failure and redirect
//! home on success. Visiting the signup page clears any existing login.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Form;
use axum::http::StatusCode;
use axum::response::Response;
use tera::Context;
use validator::Validate;
use warbler_core::AccountError;
use warbler_core::SignupRequest;
use warbler_core::accounts::authenticate;
use warbler_core::accounts::signup as register;

use crate::context::RequestContext;
use crate::error::WebError;
use crate::forms::LoginForm;
use crate::forms::SignupForm;
use crate::forms::error_messages;
use crate::routes::run_blocking;
use crate::session::FlashCategory;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Flash shown when a form's CSRF token is missing or stale.
pub(crate) const CSRF_REJECTED: &str = "Your form expired. Please try again.";

// ============================================================================
// SECTION: Signup
// ============================================================================

/// `GET /signup`.
///
/// # Errors
///
/// Returns [`WebError`] when rendering fails.
pub async fn signup_page(mut ctx: RequestContext) -> Result<Response, WebError> {
    ctx.logout();
    render_signup(ctx, &SignupForm::default(), &[], StatusCode::OK)
}

/// `POST /signup`.
///
/// # Errors
///
/// Returns [`WebError`] when the store, hasher, or rendering fails.
pub async fn signup(
    mut ctx: RequestContext,
    Form(form): Form<SignupForm>,
) -> Result<Response, WebError> {
    ctx.logout();
    if !ctx.csrf_valid(&form.csrf_token) {
        ctx.flash(FlashCategory::Danger, CSRF_REJECTED);
        return render_signup(ctx, &form, &[], StatusCode::BAD_REQUEST);
    }
    if let Err(errors) = form.validate() {
        return render_signup(ctx, &form, &error_messages(&errors), StatusCode::OK);
    }
    let request = SignupRequest {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
        image_url: Some(form.image_url.clone()),
    };
    let state = ctx.state().clone();
    match run_blocking(|| register(state.store.as_ref(), state.hasher.as_ref(), request)) {
        Ok(user) => {
            tracing::info!(user_id = %user.id, username = %user.username, "user signed up");
            ctx.login(user);
            ctx.redirect("/")
        }
        Err(AccountError::Conflict) => {
            ctx.flash(FlashCategory::Danger, "Username already taken");
            render_signup(ctx, &form, &[], StatusCode::OK)
        }
        Err(AccountError::MissingField(field)) => {
            let message = format!("{field} must not be empty.");
            render_signup(ctx, &form, &[message], StatusCode::OK)
        }
        Err(AccountError::InvalidPassword) => {
            let message = "Password must not be empty.".to_string();
            render_signup(ctx, &form, &[message], StatusCode::OK)
        }
        Err(error) => Err(error.into()),
    }
}

/// Renders the signup form.
fn render_signup(
    ctx: RequestContext,
    form: &SignupForm,
    errors: &[String],
    status: StatusCode,
) -> Result<Response, WebError> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    ctx.render_with_status(status, "users/signup.html", context)
}

// ============================================================================
// SECTION: Login
// ============================================================================

/// `GET /login`.
///
/// # Errors
///
/// Returns [`WebError`] when rendering fails.
pub async fn login_page(ctx: RequestContext) -> Result<Response, WebError> {
    render_login(ctx, &LoginForm::default(), &[], StatusCode::OK)
}

/// `POST /login`.
///
/// # Errors
///
/// Returns [`WebError`] when the store, hasher, or rendering fails.
pub async fn login(
    mut ctx: RequestContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    if !ctx.csrf_valid(&form.csrf_token) {
        ctx.flash(FlashCategory::Danger, CSRF_REJECTED);
        return render_login(ctx, &form, &[], StatusCode::BAD_REQUEST);
    }
    if let Err(errors) = form.validate() {
        return render_login(ctx, &form, &error_messages(&errors), StatusCode::OK);
    }
    let state = ctx.state().clone();
    let found = run_blocking(|| {
        authenticate(state.store.as_ref(), state.hasher.as_ref(), &form.username, &form.password)
    })?;
    match found {
        Some(user) => {
            tracing::info!(user_id = %user.id, "user logged in");
            ctx.flash(FlashCategory::Success, format!("Hello, {}!", user.username));
            ctx.login(user);
            ctx.redirect("/")
        }
        None => {
            tracing::info!(username = %form.username, "login rejected");
            ctx.flash(FlashCategory::Danger, "Invalid credentials.");
            render_login(ctx, &form, &[], StatusCode::OK)
        }
    }
}

/// Renders the login form.
fn render_login(
    ctx: RequestContext,
    form: &LoginForm,
    errors: &[String],
    status: StatusCode,
) -> Result<Response, WebError> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    ctx.render_with_status(status, "users/login.html", context)
}

// ============================================================================
// SECTION: Logout
// ============================================================================

/// `GET /logout`.
///
/// # Errors
///
/// Returns [`WebError`] when session encoding fails.
pub async fn logout(mut ctx: RequestContext) -> Result<Response, WebError> {
    if let Some(user_id) = ctx.user_id() {
        tracing::info!(user_id = %user_id, "user logged out");
    }
    ctx.logout();
    ctx.flash(FlashCategory::Success, "You have successfully logged out.");
    ctx.redirect("/login")
}
