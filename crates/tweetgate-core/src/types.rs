//! ============================================================================
//! Types - Shared data structures for Tweetgate
//! ============================================================================
//! Credential bundle persisted by the auth server, post request/response
//! shapes for the X API v2, and the error taxonomy surfaced to callers.
//! ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Credential Types
// ============================================================================

/// Authenticated account details captured during login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterUser {
    pub id: String,
    pub name: String,
    pub username: String,
}

/// Everything written to `authData.json` after a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBundle {
    pub user: TwitterUser,
    pub access_token: String,
    /// Stored only; nothing in this workspace refreshes tokens
    pub refresh_token: Option<String>,
    /// Lifetime in seconds as reported by the token endpoint, never checked
    pub expires_in: i64,
}

/// Raw token grant returned by the token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: String,
}

impl CredentialBundle {
    /// Assemble the bundle from a token grant and the verified profile
    pub fn from_grant(grant: TokenGrant, user: TwitterUser) -> Self {
        Self {
            user,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in: grant.expires_in,
        }
    }
}

// ============================================================================
// Post Types
// ============================================================================

/// Body of a `POST /2/tweets` call. Only `text` is ever sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePostRequest {
    pub text: String,
}

/// A post the operator wants to publish.
///
/// `media_ids` are accepted so callers can pass them along, but they are
/// never attached to the outgoing request.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub text: String,
    pub media_ids: Vec<String>,
}

impl PostDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media_ids: Vec::new(),
        }
    }

    pub fn with_media_ids(mut self, media_ids: Vec<String>) -> Self {
        self.media_ids = media_ids;
        self
    }

    /// Build the wire request. Media IDs are dropped.
    pub fn to_request(&self) -> CreatePostRequest {
        if !self.media_ids.is_empty() {
            tracing::warn!(
                "Ignoring {} media id(s); media attachment is not supported",
                self.media_ids.len()
            );
        }
        CreatePostRequest {
            text: self.text.clone(),
        }
    }
}

/// `data` object of a create-post response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    pub id: String,
    pub text: String,
}

/// Result of posting a tweet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetResult {
    pub tweet_id: String,
    pub url: String,
    pub data: CreatedPost,
}

// ============================================================================
// Error Types
// ============================================================================

/// Ways an authorization callback is rejected. Each maps to an HTTP reply.
///
/// Causes are deliberately coarse: an expired code and a network timeout
/// both surface as `TokenExchange`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing query parameter: {0}")]
    MissingParameter(&'static str),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
}

impl AuthError {
    /// HTTP status used when the error ends an auth server request
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingParameter(_) | AuthError::StateMismatch => 400,
            AuthError::TokenExchange(_) => 403,
        }
    }

    /// Plain-text body sent to the browser. Details stay in the logs.
    pub fn response_body(&self) -> &'static str {
        match self {
            AuthError::MissingParameter(_) => "Access denied or expired session!",
            AuthError::StateMismatch => "Stored tokens did not match!",
            AuthError::TokenExchange(_) => "Invalid verifier or access tokens!",
        }
    }
}

/// Error taxonomy surfaced to callers of the auth flow and the poster
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TweetgateError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Failed to load credentials: {0}")]
    CredentialLoad(String),

    #[error("Failed to publish post: {0}")]
    Publish(String),
}
