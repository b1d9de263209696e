// crates/warbler-web/tests/common/mod.rs
// ============================================================================
// Module: Web Test Harness
// Description: In-process client for the Warbler router.
// Purpose: Drive routes with a cookie jar and parse HTML responses.
// Dependencies: axum, cookie, scraper, tempfile, tower, url, warbler-web
// ============================================================================

//! ## Overview
//! [`TestApp`] builds the router over a fresh `SQLite` database in a temp
//! directory. Requests go through `tower::ServiceExt::oneshot`; the session
//! cookie from each response is replayed on the next request. Users are
//! seeded through the store with a cheap hasher so tests stay fast.

#![allow(dead_code, reason = "Each test binary uses a different subset of helpers.")]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::COOKIE;
use axum::http::header::LOCATION;
use axum::http::header::SET_COOKIE;
use cookie::Cookie;
use http_body_util::BodyExt;
use scraper::Html;
use scraper::Selector;
use tempfile::TempDir;
use tower::ServiceExt;
use warbler_config::WarblerConfig;
use warbler_core::HashError;
use warbler_core::Message;
use warbler_core::NewMessage;
use warbler_core::PasswordHasher;
use warbler_core::SignupRequest;
use warbler_core::User;
use warbler_core::UserId;
use warbler_core::accounts::signup;
use warbler_store_sqlite::SqliteStoreConfig;
use warbler_store_sqlite::SqliteWarblerStore;
use warbler_web::AppState;
use warbler_web::Session;
use warbler_web::router;

/// Session key shared by every test app.
pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef";

/// Password used for every seeded user.
pub const TEST_PASSWORD: &str = "password";

/// Reversible stand-in for argon2 in tests.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        let stored = hash
            .strip_prefix("plain$")
            .ok_or_else(|| HashError::Malformed(hash.to_string()))?;
        Ok(stored == password)
    }
}

/// Buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Parses the body as an HTML document.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }

    /// Counts elements matching `selector`.
    pub fn count(&self, selector: &str) -> usize {
        let selector = Selector::parse(selector).unwrap();
        self.html().select(&selector).count()
    }

    /// Returns the trimmed text of every element matching `selector`.
    pub fn texts(&self, selector: &str) -> Vec<String> {
        let selector = Selector::parse(selector).unwrap();
        self.html()
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .collect()
    }

    /// Returns the `Location` header of a redirect.
    pub fn location(&self) -> &str {
        self.headers.get(LOCATION).unwrap().to_str().unwrap()
    }
}

/// Router plus a one-cookie jar.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    cookie: Option<String>,
    _dir: TempDir,
}

impl TestApp {
    /// Builds an app with CSRF checks disabled.
    pub fn new() -> Self {
        Self::with_config(|config| config.session.csrf_enabled = false)
    }

    /// Builds an app after applying `adjust` to the default test config.
    pub fn with_config(adjust: impl FnOnce(&mut WarblerConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WarblerConfig::default();
        config.store = SqliteStoreConfig::for_path(dir.path().join("warbler.db"));
        config.session.secret_key = Some(TEST_SECRET.to_string());
        adjust(&mut config);
        config.validate().unwrap();
        let store = SqliteWarblerStore::new(config.store.clone()).unwrap();
        let state = AppState::with_hasher(config, Arc::new(store), Arc::new(PlainHasher)).unwrap();
        Self {
            router: router(state.clone()),
            state,
            cookie: None,
            _dir: dir,
        }
    }

    /// Creates a user whose password is [`TEST_PASSWORD`].
    pub fn seed_user(&self, username: &str) -> User {
        let request = SignupRequest {
            username: username.to_string(),
            email: format!("{username}@test.com"),
            password: TEST_PASSWORD.to_string(),
            image_url: None,
        };
        signup(self.state.store.as_ref(), self.state.hasher.as_ref(), request).unwrap()
    }

    /// Posts a message as `user`.
    pub fn seed_message(&self, user: &User, text: &str) -> Message {
        let message = NewMessage {
            user_id: user.id,
            text: text.to_string(),
        };
        self.state.store.create_message(&message).unwrap()
    }

    /// Installs a session cookie for `user_id` without going through `/login`.
    pub fn login_as(&mut self, user_id: UserId) {
        let value = self.state.sessions.encode(&Session::for_user(user_id)).unwrap();
        self.cookie = Some(value);
    }

    /// Replaces the session cookie with a raw value.
    pub fn set_session_cookie(&mut self, value: impl Into<String>) {
        self.cookie = Some(value.into());
    }

    /// Drops the session cookie.
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    /// Sends a GET without following redirects.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    /// Sends a form POST without following redirects.
    pub async fn post(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        self.send(Method::POST, uri, Some(encode_form(form))).await
    }

    /// Sends a GET and follows redirects.
    pub async fn get_follow(&mut self, uri: &str) -> TestResponse {
        let response = self.get(uri).await;
        self.follow_redirects(response).await
    }

    /// Sends a form POST and follows redirects.
    pub async fn post_follow(&mut self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        let response = self.post(uri, form).await;
        self.follow_redirects(response).await
    }

    async fn follow_redirects(&mut self, mut response: TestResponse) -> TestResponse {
        for _ in 0 .. 5 {
            if response.status != StatusCode::FOUND {
                return response;
            }
            let location = response.location().to_string();
            response = self.get(&location).await;
        }
        panic!("redirect loop");
    }

    async fn send(&mut self, method: Method, uri: &str, form: Option<String>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = &self.cookie {
            let name = &self.state.config.session.cookie_name;
            builder = builder.header(COOKIE, format!("{name}={value}"));
        }
        let body = match form {
            Some(encoded) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(encoded)
            }
            None => Body::empty(),
        };
        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        for header in headers.get_all(SET_COOKIE) {
            let parsed = Cookie::parse(header.to_str().unwrap().to_string()).unwrap();
            if parsed.name() == self.state.config.session.cookie_name {
                self.cookie = Some(parsed.value().to_string());
            }
        }
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

/// Encodes `pairs` as `application/x-www-form-urlencoded`.
fn encode_form(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish()
}
