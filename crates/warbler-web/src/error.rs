// crates/warbler-web/src/error.rs
// ============================================================================
// Module: Web Errors
// Description: Handler error type and its HTTP mapping.
// Purpose: Keep status codes consistent and internal detail out of responses.
// Dependencies: axum, thiserror, tracing
// ============================================================================

//! ## Overview
//! Handlers return `Result<Response, WebError>`. The error's response carries
//! an [`ErrorPage`] extension instead of a body; [`crate::routes::router`]
//! installs a layer that renders the matching template for it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use thiserror::Error;
use warbler_core::AccountError;
use warbler_core::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors surfaced by request handlers.
#[derive(Debug, Error)]
pub enum WebError {
    /// Requested resource does not exist.
    #[error("not found")]
    NotFound,
    /// Authenticated user may not perform the action.
    #[error("forbidden")]
    Forbidden,
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Account operation failure.
    #[error(transparent)]
    Account(#[from] AccountError),
    /// Template rendering failure.
    #[error("template error: {0}")]
    Template(String),
    /// Any other server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<tera::Error> for WebError {
    fn from(error: tera::Error) -> Self {
        let mut message = error.to_string();
        let mut source = std::error::Error::source(&error);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Template(message)
    }
}

impl WebError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Store(_) | Self::Account(_) | Self::Template(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Response extension asking the error-page layer to render a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPage(pub StatusCode);

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorPage(status));
        response
    }
}
