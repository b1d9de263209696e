// crates/warbler-web/src/templates.rs
// ============================================================================
// Module: Templates
// Description: Embedded tera templates and view models.
// Purpose: Compile page templates once and shape records for rendering.
// Dependencies: serde, tera, warbler-core
// ============================================================================

//! ## Overview
//! Templates are compiled into the binary with `include_str!` so the server
//! has no runtime template directory. Names ending in `.html` are
//! autoescaped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use tera::Tera;
use warbler_core::FeedItem;
use warbler_core::Message;
use warbler_core::MessageId;
use warbler_core::User;
use warbler_core::UserId;

use crate::error::WebError;

// ============================================================================
// SECTION: Template Sources
// ============================================================================

/// `(name, source)` pairs for every page template.
const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("home-anon.html", include_str!("../templates/home-anon.html")),
    ("404.html", include_str!("../templates/404.html")),
    ("error.html", include_str!("../templates/error.html")),
    ("users/signup.html", include_str!("../templates/users/signup.html")),
    ("users/login.html", include_str!("../templates/users/login.html")),
    ("users/card.html", include_str!("../templates/users/card.html")),
    ("users/index.html", include_str!("../templates/users/index.html")),
    ("users/detail.html", include_str!("../templates/users/detail.html")),
    ("users/show.html", include_str!("../templates/users/show.html")),
    ("users/following.html", include_str!("../templates/users/following.html")),
    ("users/followers.html", include_str!("../templates/users/followers.html")),
    ("users/likes.html", include_str!("../templates/users/likes.html")),
    ("users/edit.html", include_str!("../templates/users/edit.html")),
    ("messages/item.html", include_str!("../templates/messages/item.html")),
    ("messages/new.html", include_str!("../templates/messages/new.html")),
    ("messages/show.html", include_str!("../templates/messages/show.html")),
];

/// Compiles the embedded templates.
///
/// # Errors
///
/// Returns [`WebError::Template`] when a template fails to parse.
pub fn load_templates() -> Result<Tera, WebError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())?;
    tera.autoescape_on(vec![".html"]);
    Ok(tera)
}

// ============================================================================
// SECTION: View Models
// ============================================================================

/// User fields exposed to templates.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    /// User id.
    pub id: UserId,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Avatar URL.
    pub image_url: String,
    /// Header image URL.
    pub header_image_url: String,
    /// Bio text.
    pub bio: Option<String>,
    /// Location text.
    pub location: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            image_url: user.image_url.clone(),
            header_image_url: user.header_image_url.clone(),
            bio: user.bio.clone(),
            location: user.location.clone(),
        }
    }
}

/// User card with follow state relative to the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct UserCard {
    /// Card subject.
    #[serde(flatten)]
    pub user: UserView,
    /// Whether the viewer follows this user.
    pub followed_by_viewer: bool,
}

/// Message with author details and like state.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    /// Message id.
    pub id: MessageId,
    /// Message text.
    pub text: String,
    /// Human-readable posting date.
    pub date: String,
    /// Author id.
    pub user_id: UserId,
    /// Author username.
    pub username: String,
    /// Author avatar URL.
    pub image_url: String,
    /// Whether the viewer liked this message.
    pub liked: bool,
    /// Whether the viewer wrote this message.
    pub own: bool,
}

impl MessageView {
    /// Builds a view from a feed item.
    #[must_use]
    pub fn from_feed(item: &FeedItem, viewer: Option<UserId>, liked: &[MessageId]) -> Self {
        Self::build(&item.message, &item.author_username, &item.author_image_url, viewer, liked)
    }

    /// Builds a view for a message by a known author.
    #[must_use]
    pub fn from_message(
        message: &Message,
        author: &User,
        viewer: Option<UserId>,
        liked: &[MessageId],
    ) -> Self {
        Self::build(message, &author.username, &author.image_url, viewer, liked)
    }

    /// Shared constructor.
    fn build(
        message: &Message,
        username: &str,
        image_url: &str,
        viewer: Option<UserId>,
        liked: &[MessageId],
    ) -> Self {
        Self {
            id: message.id,
            text: message.text.clone(),
            date: message.timestamp.display_date(),
            user_id: message.user_id,
            username: username.to_string(),
            image_url: image_url.to_string(),
            liked: liked.contains(&message.id),
            own: viewer == Some(message.user_id),
        }
    }
}
