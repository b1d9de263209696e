// crates/warbler-web/src/routes/mod.rs
// ============================================================================
// Module: Routes
// Description: Router assembly, response layers, and shared handler helpers.
// Purpose: Map URLs to handlers and apply cross-cutting response policy.
// Dependencies: axum, tower-http, tracing
// ============================================================================

//! ## Overview
//! [`router`] builds the complete application. Layers, innermost first:
//! - error pages: responses tagged with [`ErrorPage`] get a rendered body
//! - cache policy: every response is marked uncacheable
//! - request tracing via `tower-http`

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod home;
pub mod messages;
pub mod users;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::handler::Handler;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_LENGTH;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::EXPIRES;
use axum::http::header::PRAGMA;
use axum::middleware::from_fn_with_state;
use axum::middleware::map_response;
use axum::middleware::map_response_with_state;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use tokio::runtime::Handle;
use tokio::runtime::RuntimeFlavor;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::context::session_layer;
use crate::error::ErrorPage;
use crate::error::WebError;
use crate::session::Flash;
use crate::state::AppState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `Cache-Control` value applied to every response.
const CACHE_CONTROL_VALUE: &str = "no-cache, no-store, must-revalidate, public, max-age=0";

/// `Content-Type` of rendered error pages.
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(home::homepage))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/profile", get(users::edit_profile_page).post(users::edit_profile))
        .route("/users/delete", post(users::delete_user))
        .route("/users/follow/{id}", post(users::follow))
        .route("/users/stop-following/{id}", post(users::stop_following))
        .route("/users/add_like/{id}", post(users::toggle_like))
        .route("/users/{id}", get(users::show_user))
        .route("/users/{id}/following", get(users::show_following))
        .route("/users/{id}/followers", get(users::show_followers))
        .route("/users/{id}/likes", get(users::show_likes))
        .route("/messages/new", get(messages::new_message_page).post(messages::create_message))
        .route("/messages/{id}", get(messages::show_message))
        .route("/messages/{id}/delete", post(messages::delete_message))
        .fallback(not_found);
    if let Some(dir) = &state.config.server.static_dir {
        let files = ServeDir::new(dir).not_found_service(not_found.with_state(state.clone()));
        app = app.nest_service("/static", files);
    }
    app.layer(from_fn_with_state(state.clone(), session_layer))
        .layer(map_response_with_state(state.clone(), render_error_page))
        .layer(map_response(apply_cache_policy))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fallback for unmatched paths.
async fn not_found() -> WebError {
    WebError::NotFound
}

// ============================================================================
// SECTION: Response Layers
// ============================================================================

/// Marks the response uncacheable.
async fn apply_cache_policy(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    response
}

/// Renders a body for responses produced from a [`WebError`]. Headers set by
/// inner layers, such as the session cookie, are kept.
async fn render_error_page(State(state): State<AppState>, response: Response) -> Response {
    let Some(ErrorPage(status)) = response.extensions().get::<ErrorPage>().copied() else {
        return response;
    };
    let template = if status == StatusCode::NOT_FOUND { "404.html" } else { "error.html" };
    let mut context = tera::Context::new();
    context.insert("status", &status.as_u16());
    context.insert("flashes", &Vec::<Flash>::new());
    context.insert("current_user", &Option::<()>::None);
    context.insert("csrf_token", "");
    match state.templates.render(template, &context) {
        Ok(body) => {
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(CONTENT_LENGTH);
            parts.headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
            Response::from_parts(parts, Body::from(body))
        }
        Err(error) => {
            tracing::error!(error = %error, template, "error page render failed");
            response
        }
    }
}

// ============================================================================
// SECTION: Handler Helpers
// ============================================================================

/// Parses a path identifier, treating malformed values as missing.
fn parse_id<T: FromStr>(raw: &str) -> Result<T, WebError> {
    raw.parse().map_err(|_| WebError::NotFound)
}

/// Runs CPU-heavy work (password hashing) off the async scheduler when the
/// runtime allows it.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}
