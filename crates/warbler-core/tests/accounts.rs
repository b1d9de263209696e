// crates/warbler-core/tests/accounts.rs
// ============================================================================
// Module: Account and Graph Model Tests
// Description: Signup, authentication, follow, and like semantics.
// Purpose: Validate model rules against the in-memory store.
// Dependencies: warbler-core
// ============================================================================

//! ## Overview
//! Exercises the account operations and graph queries that every store must
//! support:
//! - signup hashes passwords and rejects empty/duplicate fields
//! - authenticate rejects unknown users and wrong passwords
//! - follow edges are directional
//! - likes are unique per user and message

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

use warbler_core::AccountError;
use warbler_core::Argon2PasswordHasher;
use warbler_core::DEFAULT_IMAGE_URL;
use warbler_core::InMemoryWarblerStore;
use warbler_core::NewMessage;
use warbler_core::NewUser;
use warbler_core::ProfileUpdate;
use warbler_core::StoreError;
use warbler_core::SignupRequest;
use warbler_core::User;
use warbler_core::WarblerStore;
use warbler_core::accounts::authenticate;
use warbler_core::accounts::signup;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn request(username: &str, email: &str, password: &str) -> SignupRequest {
    SignupRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        image_url: None,
    }
}

fn signup_user(store: &InMemoryWarblerStore, username: &str, password: &str) -> User {
    signup(
        store,
        &Argon2PasswordHasher::new(),
        request(username, &format!("{username}@email.com"), password),
    )
    .expect("signup")
}

// ============================================================================
// SECTION: Signup
// ============================================================================

#[test]
fn new_user_has_no_messages_or_followers() {
    let store = InMemoryWarblerStore::new();
    let user = store
        .create_user(&NewUser {
            username: "testuser".to_string(),
            email: "test@test.com".to_string(),
            password_hash: "HASHED_PASSWORD".to_string(),
            image_url: None,
        })
        .expect("create user");

    assert!(store.messages_by_user(user.id, 100).expect("messages").is_empty());
    assert!(store.followers(user.id).expect("followers").is_empty());
    assert_eq!(user.image_url, DEFAULT_IMAGE_URL);
}

#[test]
fn valid_signup_stores_hashed_password() {
    let store = InMemoryWarblerStore::new();
    let user = signup_user(&store, "user3", "password3");

    let loaded = store.user(user.id).expect("load").expect("user exists");
    assert_eq!(loaded.username, "user3");
    assert_eq!(loaded.email, "user3@email.com");
    assert_ne!(loaded.password_hash, "password3");
    assert!(loaded.password_hash.starts_with("$argon2id$"));
}

#[test]
fn signup_rejects_empty_username_and_email() {
    let store = InMemoryWarblerStore::new();
    let hasher = Argon2PasswordHasher::new();

    let missing_username = signup(&store, &hasher, request("", "none@email.com", "password"));
    assert_eq!(missing_username, Err(AccountError::MissingField("username")));

    let missing_email = signup(&store, &hasher, request("Invalid", "  ", "password"));
    assert_eq!(missing_email, Err(AccountError::MissingField("email")));
    assert!(store.list_users(None).expect("list").is_empty());
}

#[test]
fn signup_rejects_empty_password() {
    let store = InMemoryWarblerStore::new();
    let result =
        signup(&store, &Argon2PasswordHasher::new(), request("Invalid", "invalid@email.com", ""));
    assert_eq!(result, Err(AccountError::InvalidPassword));
}

#[test]
fn signup_rejects_duplicate_username_or_email() {
    let store = InMemoryWarblerStore::new();
    let hasher = Argon2PasswordHasher::new();
    signup_user(&store, "test1", "password1");

    let same_name = signup(&store, &hasher, request("test1", "other@email.com", "password"));
    assert_eq!(same_name, Err(AccountError::Conflict));

    let same_email = signup(&store, &hasher, request("other", "test1@email.com", "password"));
    assert_eq!(same_email, Err(AccountError::Conflict));
}

// ============================================================================
// SECTION: Authenticate
// ============================================================================

#[test]
fn store_rejects_blank_username_or_email() {
    let store = InMemoryWarblerStore::new();
    let blank = NewUser {
        username: " ".to_string(),
        email: String::new(),
        password_hash: "HASHED_PASSWORD".to_string(),
        image_url: None,
    };
    assert!(matches!(store.create_user(&blank), Err(StoreError::Conflict(_))));

    let user = signup_user(&store, "testuser", "password");
    let update = ProfileUpdate {
        username: "testuser".to_string(),
        email: "  ".to_string(),
        image_url: String::new(),
        header_image_url: String::new(),
        bio: None,
        location: None,
    };
    assert!(matches!(store.update_user(user.id, &update), Err(StoreError::Conflict(_))));
    assert_eq!(store.user(user.id).unwrap().unwrap().email, "testuser@email.com");
}

#[test]
fn user_search_ignores_case_beyond_ascii() {
    let store = InMemoryWarblerStore::new();
    signup_user(&store, "\u{c9}mile", "password");
    signup_user(&store, "other", "password");

    let found = store.list_users(Some("\u{e9}MI")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "\u{c9}mile");
}

#[test]
fn authenticate_returns_user_for_valid_credentials() {
    let store = InMemoryWarblerStore::new();
    let user = signup_user(&store, "test1", "password1");
    let found = authenticate(&store, &Argon2PasswordHasher::new(), "test1", "password1")
        .expect("authenticate")
        .expect("valid credentials");
    assert_eq!(found.id, user.id);
}

#[test]
fn authenticate_rejects_unknown_username_and_wrong_password() {
    let store = InMemoryWarblerStore::new();
    let hasher = Argon2PasswordHasher::new();
    signup_user(&store, "test1", "password1");

    assert!(authenticate(&store, &hasher, "notinthedb", "password").expect("auth").is_none());
    assert!(authenticate(&store, &hasher, "test1", "password").expect("auth").is_none());
}

// ============================================================================
// SECTION: Follows
// ============================================================================

#[test]
fn follows_are_directional() {
    let store = InMemoryWarblerStore::new();
    let user1 = signup_user(&store, "test1", "password1");
    let user2 = signup_user(&store, "test2", "password2");
    store.follow(user1.id, user2.id).expect("follow");

    assert!(store.is_following(user1.id, user2.id).expect("query"));
    assert!(!store.is_following(user2.id, user1.id).expect("query"));
    assert!(store.is_followed_by(user2.id, user1.id).expect("query"));
    assert!(!store.is_followed_by(user1.id, user2.id).expect("query"));

    assert!(store.followers(user1.id).expect("followers").is_empty());
    assert_eq!(store.following(user1.id).expect("following")[0].id, user2.id);
    assert_eq!(store.followers(user2.id).expect("followers")[0].id, user1.id);
    assert!(store.following(user2.id).expect("following").is_empty());
}

#[test]
fn follow_is_idempotent_and_rejects_self() {
    let store = InMemoryWarblerStore::new();
    let user1 = signup_user(&store, "test1", "password1");
    let user2 = signup_user(&store, "test2", "password2");
    store.follow(user1.id, user2.id).expect("follow");
    store.follow(user1.id, user2.id).expect("follow again");
    assert_eq!(store.user_stats(user1.id).expect("stats").following, 1);
    assert!(store.follow(user1.id, user1.id).is_err());
}

// ============================================================================
// SECTION: Messages and Likes
// ============================================================================

#[test]
fn likes_are_recorded_per_user() {
    let store = InMemoryWarblerStore::new();
    let author = signup_user(&store, "test", "password");
    let liker = signup_user(&store, "user2", "password2");
    let first = store
        .create_message(&NewMessage { user_id: author.id, text: "test one".to_string() })
        .expect("message");
    store
        .create_message(&NewMessage { user_id: author.id, text: "test two".to_string() })
        .expect("message");

    store.like(liker.id, first.id).expect("like");
    store.like(liker.id, first.id).expect("like again");

    assert_eq!(store.liked_message_ids(liker.id).expect("likes"), vec![first.id]);
    assert_eq!(store.likes_for_message(first.id).expect("likers"), vec![liker.id]);
    assert_eq!(store.messages_by_user(author.id, 100).expect("messages").len(), 2);
}

#[test]
fn deleting_user_cascades_to_messages_follows_and_likes() {
    let store = InMemoryWarblerStore::new();
    let author = signup_user(&store, "author", "password");
    let fan = signup_user(&store, "fan", "password");
    let message = store
        .create_message(&NewMessage { user_id: author.id, text: "hello".to_string() })
        .expect("message");
    store.follow(fan.id, author.id).expect("follow");
    store.like(fan.id, message.id).expect("like");

    assert!(store.delete_user(author.id).expect("delete"));
    assert!(store.message(message.id).expect("load").is_none());
    assert!(store.following(fan.id).expect("following").is_empty());
    assert!(store.liked_message_ids(fan.id).expect("likes").is_empty());
}
