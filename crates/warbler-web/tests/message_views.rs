// crates/warbler-web/tests/message_views.rs
// ============================================================================
// Module: Message View Tests
// Description: Posting, showing, and deleting messages; the home timeline.
// Purpose: Validate `/messages` routes and `/` end to end.
// Dependencies: tokio, warbler-web
// ============================================================================

//! ## Overview
//! Covers the message lifecycle over HTTP, including the ownership rule for
//! deletes and the login checks that guard every write.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use axum::http::StatusCode;
use common::TestApp;
use warbler_core::UserId;
use warbler_web::context::ACCESS_UNAUTHORIZED;

// ============================================================================
// SECTION: Posting
// ============================================================================

#[tokio::test]
async fn add_message_stores_and_redirects_to_author() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    app.login_as(me.id);

    let response = app.post("/messages/new", &[("text", "Hello")]).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), format!("/users/{}", me.id));
    let messages = app.state.store.messages_by_user(me.id, 10).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Hello");
}

#[tokio::test]
async fn add_message_rejects_overlong_text() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    app.login_as(me.id);

    let text = "x".repeat(141);
    let response = app.post("/messages/new", &[("text", &text)]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Messages are 1-140 characters."));
    assert!(app.state.store.messages_by_user(me.id, 10).unwrap().is_empty());
}

#[tokio::test]
async fn add_message_without_session_is_unauthorized() {
    let mut app = TestApp::new();
    app.seed_user("testuser");

    let response = app.post_follow("/messages/new", &[("text", "Hello")]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(ACCESS_UNAUTHORIZED));
}

#[tokio::test]
async fn add_message_for_missing_user_is_unauthorized() {
    let mut app = TestApp::new();
    app.seed_user("testuser");
    app.login_as(UserId::from_raw(99_222_224).unwrap());

    let response = app.post_follow("/messages/new", &[("text", "Hello")]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(ACCESS_UNAUTHORIZED));
}

#[tokio::test]
async fn compose_page_requires_login() {
    let mut app = TestApp::new();

    let response = app.get_follow("/messages/new").await;
    assert!(response.body.contains(ACCESS_UNAUTHORIZED));
}

// ============================================================================
// SECTION: Showing
// ============================================================================

#[tokio::test]
async fn message_show_renders_text_and_author() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    let message = app.seed_message(&me, "a test message");
    app.login_as(me.id);

    let response = app.get(&format!("/messages/{}", message.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("a test message"));
    assert!(response.body.contains("@testuser"));
    assert!(response.body.contains("Delete"));
}

#[tokio::test]
async fn unknown_message_is_not_found() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    app.login_as(me.id);

    let response = app.get("/messages/99999999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// SECTION: Deleting
// ============================================================================

#[tokio::test]
async fn author_can_delete_message() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    let message = app.seed_message(&me, "a test message");
    app.login_as(me.id);

    let response = app.post(&format!("/messages/{}/delete", message.id), &[]).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), format!("/users/{}", me.id));
    assert!(app.state.store.message(message.id).unwrap().is_none());
}

#[tokio::test]
async fn other_users_cannot_delete_message() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    let other = app.seed_user("unauthorized-user");
    let message = app.seed_message(&me, "a test message");
    app.login_as(other.id);

    let response = app.post_follow(&format!("/messages/{}/delete", message.id), &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(ACCESS_UNAUTHORIZED));
    assert!(app.state.store.message(message.id).unwrap().is_some());
}

#[tokio::test]
async fn delete_without_session_is_unauthorized() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    let message = app.seed_message(&me, "a test message");

    let response = app.post_follow(&format!("/messages/{}/delete", message.id), &[]).await;
    assert!(response.body.contains(ACCESS_UNAUTHORIZED));
    assert!(app.state.store.message(message.id).unwrap().is_some());
}

// ============================================================================
// SECTION: Timeline
// ============================================================================

#[tokio::test]
async fn home_timeline_shows_own_and_followed_messages() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    let followed = app.seed_user("followed");
    let stranger = app.seed_user("stranger");
    app.state.store.follow(me.id, followed.id).unwrap();
    app.seed_message(&me, "my own warble");
    app.seed_message(&followed, "followed warble");
    app.seed_message(&stranger, "stranger warble");
    app.login_as(me.id);

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.count("#messages li.list-group-item"), 2);
    assert!(response.body.contains("my own warble"));
    assert!(response.body.contains("followed warble"));
    assert!(!response.body.contains("stranger warble"));
    assert_eq!(response.texts("li.home-stat h4"), vec!["1", "1", "0"]);
}

#[tokio::test]
async fn anonymous_home_is_the_landing_page() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    app.seed_message(&me, "hidden warble");

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Sign up now"));
    assert!(!response.body.contains("@testuser"));
    assert!(!response.body.contains("hidden warble"));
}

#[tokio::test]
async fn timeline_marks_liked_messages() {
    let mut app = TestApp::new();
    let me = app.seed_user("testuser");
    let followed = app.seed_user("followed");
    app.state.store.follow(me.id, followed.id).unwrap();
    let liked = app.seed_message(&followed, "liked warble");
    app.seed_message(&followed, "plain warble");
    app.state.store.like(me.id, liked.id).unwrap();
    app.login_as(me.id);

    let response = app.get("/").await;
    assert_eq!(response.count("form.messages-like button.btn-primary"), 1);
    assert_eq!(response.count("form.messages-like button.btn-secondary"), 1);
}
