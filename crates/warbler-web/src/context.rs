// crates/warbler-web/src/context.rs
// ============================================================================
// Module: Request Context
// Description: Per-request session, current user, and response helpers.
// Purpose: Give handlers one place to read login state and emit pages.
// Dependencies: axum, cookie, subtle, tera, tracing, warbler-core
// ============================================================================

//! ## Overview
//! [`session_layer`] decodes the signed session cookie and resolves the
//! session's user through the store before any handler runs. After the
//! handler returns, it re-issues the cookie when the session changed.
//! [`RequestContext`] is the axum extractor handlers use to read and change
//! that session.
//!
//! A session naming a user that no longer exists is treated as logged out.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::COOKIE;
use axum::http::header::LOCATION;
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use cookie::Cookie;
use cookie::SameSite;
use subtle::ConstantTimeEq;
use warbler_core::User;
use warbler_core::UserId;

use crate::error::WebError;
use crate::session::Flash;
use crate::session::FlashCategory;
use crate::session::Session;
use crate::state::AppState;
use crate::templates::UserView;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Flash text shown when a login-only page is requested anonymously.
pub const ACCESS_UNAUTHORIZED: &str = "Access unauthorized.";

// ============================================================================
// SECTION: Session Layer
// ============================================================================

/// Session state shared between [`session_layer`] and the request's
/// [`RequestContext`].
#[derive(Clone)]
struct SessionSlot {
    /// Pending session for the current request.
    inner: Arc<Mutex<PendingSession>>,
}

/// Session decoded for one request.
struct PendingSession {
    /// Session payload.
    session: Session,
    /// User resolved from the session.
    current_user: Option<User>,
    /// Whether the cookie must be re-issued.
    dirty: bool,
}

impl SessionSlot {
    /// Locks the pending session.
    fn lock(&self) -> Result<MutexGuard<'_, PendingSession>, WebError> {
        self.inner.lock().map_err(|_| WebError::Internal("session slot poisoned".to_string()))
    }
}

/// Decodes the session before the handler runs and re-issues the cookie
/// afterwards when anything changed it, including on error responses.
pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let pending = match load_session(&state, request.headers()) {
        Ok(pending) => pending,
        Err(error) => return error.into_response(),
    };
    let slot = SessionSlot {
        inner: Arc::new(Mutex::new(pending)),
    };
    request.extensions_mut().insert(slot.clone());
    let mut response = next.run(request).await;
    if let Err(error) = attach_cookie(&state, &slot, &mut response) {
        return error.into_response();
    }
    response
}

/// Reads the session cookie and resolves its user through the store.
fn load_session(state: &AppState, headers: &HeaderMap) -> Result<PendingSession, WebError> {
    let raw = read_cookie(headers, &state.config.session.cookie_name);
    let decoded = raw.as_deref().and_then(|value| state.sessions.decode(value));
    let mut dirty = raw.is_some() && decoded.is_none();
    let mut session = decoded.unwrap_or_default();
    let current_user = match session.user_id {
        Some(id) => state.store.user(id)?,
        None => None,
    };
    if session.user_id.is_some() && current_user.is_none() {
        tracing::debug!("session references a missing user; clearing login");
        session.user_id = None;
        dirty = true;
    }
    Ok(PendingSession {
        session,
        current_user,
        dirty,
    })
}

/// Appends the session cookie to `response` when the session changed.
fn attach_cookie(
    state: &AppState,
    slot: &SessionSlot,
    response: &mut Response,
) -> Result<(), WebError> {
    let pending = slot.lock()?;
    if !pending.dirty {
        return Ok(());
    }
    let settings = &state.config.session;
    let value =
        state.sessions.encode(&pending.session).map_err(|err| WebError::Internal(err.to_string()))?;
    let cookie = Cookie::build((settings.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookie)
        .build();
    let header = HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| WebError::Internal("session cookie is not a header value".to_string()))?;
    response.headers_mut().append(SET_COOKIE, header);
    Ok(())
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Per-request view of the session and current user.
///
/// Changes are written back to the request's session slot when the context
/// is dropped, so they survive early error returns.
///
/// # Invariants
/// - `current_user` is `Some` only when the session's user exists in the store.
pub struct RequestContext {
    /// Shared application state.
    state: AppState,
    /// Slot owned by [`session_layer`].
    slot: SessionSlot,
    /// Working copy of the session.
    session: Session,
    /// Whether the working copy changed.
    dirty: bool,
    /// Logged-in user resolved from the session.
    current_user: Option<User>,
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let slot = parts
            .extensions
            .get::<SessionSlot>()
            .cloned()
            .ok_or_else(|| WebError::Internal("session layer is not installed".to_string()))?;
        let (session, current_user) = {
            let pending = slot.lock()?;
            (pending.session.clone(), pending.current_user.clone())
        };
        Ok(Self {
            state: state.clone(),
            slot,
            session,
            dirty: false,
            current_user,
        })
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        if !self.dirty {
            return;
        }
        match self.slot.inner.lock() {
            Ok(mut pending) => {
                pending.session = std::mem::take(&mut self.session);
                pending.current_user = self.current_user.take();
                pending.dirty = true;
            }
            Err(_) => tracing::error!("session slot poisoned; dropping session changes"),
        }
    }
}

impl RequestContext {
    /// Returns the shared state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns the logged-in user.
    #[must_use]
    pub const fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Returns the logged-in user's id.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.current_user.as_ref().map(|user| user.id)
    }

    /// Queues a flash message for the next rendered page.
    pub fn flash(&mut self, category: FlashCategory, text: impl Into<String>) {
        self.session.flashes.push(Flash::new(category, text));
        self.dirty = true;
    }

    /// Logs `user` in and rotates the CSRF token.
    pub fn login(&mut self, user: User) {
        self.session.user_id = Some(user.id);
        self.session.csrf_token = None;
        self.current_user = Some(user);
        self.dirty = true;
    }

    /// Clears the login.
    pub fn logout(&mut self) {
        if self.session.user_id.is_some() || self.current_user.is_some() {
            self.session.user_id = None;
            self.session.csrf_token = None;
            self.current_user = None;
            self.dirty = true;
        }
    }

    /// Returns true when `token` matches the session token or CSRF is disabled.
    #[must_use]
    pub fn csrf_valid(&self, token: &str) -> bool {
        if !self.state.config.session.csrf_enabled {
            return true;
        }
        self.session
            .csrf_token
            .as_deref()
            .is_some_and(|expected| !token.is_empty() && tokens_match(expected, token))
    }

    /// Renders `template` with the flash, user, and CSRF context filled in.
    ///
    /// # Errors
    ///
    /// Returns [`WebError`] when rendering fails.
    pub fn render(self, template: &str, context: tera::Context) -> Result<Response, WebError> {
        self.render_with_status(StatusCode::OK, template, context)
    }

    /// Renders `template` with an explicit status code.
    ///
    /// # Errors
    ///
    /// Returns [`WebError`] when rendering fails.
    pub fn render_with_status(
        mut self,
        status: StatusCode,
        template: &str,
        mut context: tera::Context,
    ) -> Result<Response, WebError> {
        let flashes = std::mem::take(&mut self.session.flashes);
        if !flashes.is_empty() || self.session.csrf_token.is_none() {
            self.dirty = true;
        }
        let csrf_token = self.session.ensure_csrf_token().to_string();
        context.insert("flashes", &flashes);
        context.insert("csrf_token", &csrf_token);
        context.insert("current_user", &self.current_user.as_ref().map(UserView::from));
        let body = self.state.templates.render(template, &context)?;
        Ok((status, Html(body)).into_response())
    }

    /// Issues a `302 Found` redirect.
    ///
    /// # Errors
    ///
    /// Returns [`WebError`] when `location` is not a valid header value.
    pub fn redirect(self, location: &str) -> Result<Response, WebError> {
        let location = HeaderValue::from_str(location).map_err(|_| {
            WebError::Internal("redirect location is not a header value".to_string())
        })?;
        let mut response = StatusCode::FOUND.into_response();
        response.headers_mut().insert(LOCATION, location);
        Ok(response)
    }

    /// Flashes "Access unauthorized." and redirects home.
    ///
    /// # Errors
    ///
    /// Returns [`WebError`] when the redirect cannot be built.
    pub fn unauthorized(mut self) -> Result<Response, WebError> {
        tracing::info!(user_id = ?self.user_id(), "denied access to login-only page");
        self.flash(FlashCategory::Danger, ACCESS_UNAUTHORIZED);
        self.redirect("/")
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the named cookie from all `Cookie` headers.
fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// Compares two tokens in constant time.
fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    use super::read_cookie;
    use super::tokens_match;

    #[test]
    fn read_cookie_finds_named_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; other=1"));
        headers.append(COOKIE, HeaderValue::from_static("warbler_session=abc.def"));
        assert_eq!(read_cookie(&headers, "warbler_session").as_deref(), Some("abc.def"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn tokens_match_requires_equal_bytes() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
    }
}
