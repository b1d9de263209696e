// crates/warbler-web/src/forms.rs
// ============================================================================
// Module: Forms
// Description: Form payloads and their validation rules.
// Purpose: Reject malformed submissions before they reach the store.
// Dependencies: serde, validator
// ============================================================================

//! ## Overview
//! Every field defaults to empty so a missing field reports a validation
//! error instead of an extractor rejection. Validation messages are rendered
//! next to the form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;

use serde::Deserialize;
use serde::Serialize;
use validator::Validate;
use validator::ValidationError;
use validator::ValidationErrors;

// ============================================================================
// SECTION: Forms
// ============================================================================

/// Signup form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SignupForm {
    /// Requested username.
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "Username is required."))]
    pub username: String,
    /// Email address.
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    /// Password.
    #[serde(default, skip_serializing)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
    /// Optional avatar URL.
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url"))]
    pub image_url: String,
    /// CSRF token.
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

/// Login form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    /// Username.
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    /// Password.
    #[serde(default, skip_serializing)]
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
    /// CSRF token.
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

/// New message form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MessageForm {
    /// Message body.
    #[serde(default)]
    #[validate(length(min = 1, max = 140, message = "Messages are 1-140 characters."))]
    pub text: String,
    /// CSRF token.
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

/// Profile edit form; `password` confirms the change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EditProfileForm {
    /// New username.
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "Username is required."))]
    pub username: String,
    /// New email address.
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    /// Avatar URL; blank restores the default.
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url"))]
    pub image_url: String,
    /// Header image URL; blank restores the default.
    #[serde(default)]
    #[validate(custom(function = "validate_optional_url"))]
    pub header_image_url: String,
    /// Bio text.
    #[serde(default)]
    #[validate(length(max = 500, message = "Bio is limited to 500 characters."))]
    pub bio: String,
    /// Location text.
    #[serde(default)]
    #[validate(length(max = 100, message = "Location is limited to 100 characters."))]
    pub location: String,
    /// Current password.
    #[serde(default, skip_serializing)]
    pub password: String,
    /// CSRF token.
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

impl EditProfileForm {
    /// Trims the identity fields so blank values fail validation.
    #[must_use]
    pub fn trimmed(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }
}

/// Search query for the user list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    /// Username substring.
    #[serde(default)]
    pub q: Option<String>,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Accepts blank values, absolute http(s) URLs, and site-relative paths.
fn validate_optional_url(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty()
        || value.starts_with("http://")
        || value.starts_with("https://")
        || (value.starts_with('/') && !value.starts_with("//"))
    {
        return Ok(());
    }
    Err(ValidationError::new("url").with_message(Cow::Borrowed("Enter a valid URL.")))
}

/// Flattens validation errors into display messages, ordered by field.
#[must_use]
pub fn error_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|left, right| left.0.cmp(&right.0));
    fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid."), ToString::to_string)
            })
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
