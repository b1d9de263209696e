// crates/warbler-web/tests/user_views.rs
// ============================================================================
// Module: User View Tests
// Description: User listing, search, profiles, follows, and likes over HTTP.
// Purpose: Validate `/users` pages and actions end to end.
// Dependencies: tokio, warbler-web
// ============================================================================

//! ## Overview
//! Each test seeds a fresh database, then drives the router:
//! - listing and search show matching `@username`s only
//! - profiles render four counters and the user's messages
//! - follow lists are login-only and show the right users
//! - likes toggle, refuse the author, and require login

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
use warbler_core::Message;
use warbler_core::User;
use warbler_web::context::ACCESS_UNAUTHORIZED;

/// Seeds `testuser` plus four others.
fn seed_users(app: &TestApp) -> (User, Vec<User>) {
    let me = app.seed_user("testuser");
    let others = ["abc", "efg", "hij", "testing"].iter().map(|name| app.seed_user(name)).collect();
    (me, others)
}

/// `abc` and `efg` follow nobody; `testuser` follows both; `abc` follows `testuser`.
fn seed_follows(app: &TestApp, me: &User, others: &[User]) {
    app.state.store.follow(me.id, others[0].id).unwrap();
    app.state.store.follow(me.id, others[1].id).unwrap();
    app.state.store.follow(others[0].id, me.id).unwrap();
}

/// Two messages by `testuser`, one by `abc`, and a like from `testuser` on it.
fn seed_likes(app: &TestApp, me: &User, others: &[User]) -> Message {
    app.seed_message(me, "trending warble");
    app.seed_message(me, "Eat some lunch");
    let liked = app.seed_message(&others[0], "likable warbler");
    app.state.store.like(me.id, liked.id).unwrap();
    liked
}

// ============================================================================
// SECTION: Listing and Search
// ============================================================================

#[tokio::test]
async fn users_index_lists_everyone() {
    let mut app = TestApp::new();
    seed_users(&app);

    let response = app.get("/users").await;
    assert_eq!(response.status, StatusCode::OK);
    for name in ["@testuser", "@abc", "@efg", "@hij", "@testing"] {
        assert!(response.body.contains(name), "missing {name}");
    }
}

#[tokio::test]
async fn users_search_filters_by_username() {
    let mut app = TestApp::new();
    seed_users(&app);

    let response = app.get("/users?q=test").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("@testuser"));
    assert!(response.body.contains("@testing"));
    for name in ["@abc", "@efg", "@hij"] {
        assert!(!response.body.contains(name), "unexpected {name}");
    }
}

#[tokio::test]
async fn users_search_without_matches_says_so() {
    let mut app = TestApp::new();
    seed_users(&app);

    let response = app.get("/users?q=nobody").await;
    assert!(response.body.contains("Sorry, no users found"));
}

#[tokio::test]
async fn users_search_ignores_case_beyond_ascii() {
    let mut app = TestApp::new();
    app.seed_user("\u{c9}mile");
    app.seed_user("emil");

    let response = app.get("/users?q=%C3%A9mile").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("@\u{c9}mile"));
    assert!(!response.body.contains("@emil"));
}

// ============================================================================
// SECTION: Profiles
// ============================================================================

#[tokio::test]
async fn user_show_renders_profile() {
    let mut app = TestApp::new();
    let (me, _) = seed_users(&app);
    app.login_as(me.id);

    let response = app.get(&format!("/users/{}", me.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("@testuser"));
    assert!(response.body.contains("Edit Profile"));
}

#[tokio::test]
async fn user_show_counts_messages_and_likes() {
    let mut app = TestApp::new();
    let (me, others) = seed_users(&app);
    seed_likes(&app, &me, &others);
    app.login_as(me.id);

    let response = app.get(&format!("/users/{}", me.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.count("li.stat"), 4);
    assert_eq!(response.texts("li.stat h4"), vec!["2", "0", "0", "1"]);
    assert_eq!(response.count("li.list-group-item"), 2);
    assert!(response.body.contains("trending warble"));
    assert!(!response.body.contains("likable warbler"));
}

#[tokio::test]
async fn user_show_is_public() {
    let mut app = TestApp::new();
    let (me, _) = seed_users(&app);
    app.seed_message(&me, "hello world");

    let response = app.get(&format!("/users/{}", me.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("hello world"));
    assert!(!response.body.contains("Edit Profile"));
    assert!(!response.body.contains("/users/add_like/"));
}

#[tokio::test]
async fn unknown_and_malformed_user_ids_are_not_found() {
    let mut app = TestApp::new();
    seed_users(&app);

    let response = app.get("/users/99999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("404"));
    let response = app.get("/users/not-a-number").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn liked_messages_page_lists_likes() {
    let mut app = TestApp::new();
    let (me, others) = seed_users(&app);
    seed_likes(&app, &me, &others);
    app.login_as(me.id);

    let response = app.get(&format!("/users/{}/likes", me.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.count("li.list-group-item"), 1);
    assert!(response.body.contains("likable warbler"));
    assert!(!response.body.contains("trending warble"));
}

// ============================================================================
// SECTION: Follows
// ============================================================================

#[tokio::test]
async fn show_following_lists_followed_users() {
    let mut app = TestApp::new();
    let (me, others) = seed_users(&app);
    seed_follows(&app, &me, &others);
    app.login_as(me.id);

    let response = app.get(&format!("/users/{}/following", me.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("@abc"));
    assert!(response.body.contains("@efg"));
    assert!(!response.body.contains("@hij"));
    assert!(!response.body.contains("@testing"));
}

#[tokio::test]
async fn show_followers_lists_followers() {
    let mut app = TestApp::new();
    let (me, others) = seed_users(&app);
    seed_follows(&app, &me, &others);
    app.login_as(me.id);

    let response = app.get(&format!("/users/{}/followers", me.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("@abc"));
    for name in ["@efg", "@hij", "@testing"] {
        assert!(!response.body.contains(name), "unexpected {name}");
    }
}

#[tokio::test]
async fn follow_pages_require_login() {
    let mut app = TestApp::new();
    let (me, others) = seed_users(&app);
    seed_follows(&app, &me, &others);

    for page in ["following", "followers", "likes"] {
        app.clear_cookies();
        let response = app.get_follow(&format!("/users/{}/{page}", me.id)).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(!response.body.contains("@abc"));
        assert!(response.body.contains(ACCESS_UNAUTHORIZED));
    }
}

#[tokio::test]
async fn follow_and_unfollow_update_the_graph() {
    let mut app = TestApp::new();
    let (me, others) = seed_users(&app);
    app.login_as(me.id);

    let response = app.post(&format!("/users/follow/{}", others[2].id), &[]).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), format!("/users/{}/following", me.id));
    assert!(app.state.store.is_following(me.id, others[2].id).unwrap());
    assert!(!app.state.store.is_following(others[2].id, me.id).unwrap());

    app.post(&format!("/users/stop-following/{}", others[2].id), &[]).await;
    assert!(!app.state.store.is_following(me.id, others[2].id).unwrap());
}

#[tokio::test]
async fn following_yourself_is_refused() {
    let mut app = TestApp::new();
    let (me, _) = seed_users(&app);
    app.login_as(me.id);

    let response = app.post_follow(&format!("/users/follow/{}", me.id), &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("You cannot follow yourself."));
    assert!(!app.state.store.is_following(me.id, me.id).unwrap());
}

#[tokio::test]
async fn follow_requires_login() {
    let mut app = TestApp::new();
    let (_, others) = seed_users(&app);

    let response = app.post_follow(&format!("/users/follow/{}", others[0].id), &[]).await;
    assert!(response.body.contains(ACCESS_UNAUTHORIZED));
    assert_eq!(app.state.store.user_stats(others[0].id).unwrap().followers, 0);
}

// ============================================================================
// SECTION: Likes
// ============================================================================

#[tokio::test]
async fn add_like_then_remove_it() {
    let mut app = TestApp::new();
    let (me, others) = seed_users(&app);
    let message = app.seed_message(&others[0], "The earth is round");
    app.login_as(me.id);

    let response = app.post(&format!("/users/add_like/{}", message.id), &[]).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(app.state.store.likes_for_message(message.id).unwrap(), vec![me.id]);

    app.post(&format!("/users/add_like/{}", message.id), &[]).await;
    assert!(app.state.store.likes_for_message(message.id).unwrap().is_empty());
}

#[tokio::test]
async fn liking_own_message_is_forbidden() {
    let mut app = TestApp::new();
    let (me, _) = seed_users(&app);
    let message = app.seed_message(&me, "mine");
    app.login_as(me.id);

    let response = app.post(&format!("/users/add_like/{}", message.id), &[]).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app.state.store.likes_for_message(message.id).unwrap().is_empty());
}

#[tokio::test]
async fn liking_unknown_message_is_not_found() {
    let mut app = TestApp::new();
    let (me, _) = seed_users(&app);
    app.login_as(me.id);

    let response = app.post("/users/add_like/4242", &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unauthenticated_like_is_rejected() {
    let mut app = TestApp::new();
    let (me, others) = seed_users(&app);
    let liked = seed_likes(&app, &me, &others);

    let response = app.post_follow(&format!("/users/add_like/{}", liked.id), &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(ACCESS_UNAUTHORIZED));
    assert_eq!(app.state.store.likes_for_message(liked.id).unwrap().len(), 1);
}
