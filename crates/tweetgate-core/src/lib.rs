//! ============================================================================
//! TWEETGATE-CORE
//! ============================================================================
//! Backend logic shared by the `auth-server` and `post-tweet` binaries:
//! - OAuth 2.0 Authorization Code + PKCE handshake against the X API
//! - Signed-cookie sessions for in-flight authorization attempts
//! - Credential bundle persistence (authData.json)
//! - Single-post publishing via Twitter API v2
//! ============================================================================

pub mod auth;
pub mod config;
pub mod executor;
pub mod poster;
pub mod server;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use auth::{AuthFlow, OAuthProvider, SessionStore, TwitterOAuth};
pub use config::{AuthServerConfig, DEFAULT_AUTH_DATA_FILE, DEFAULT_PORT};
pub use executor::{TweetPublisher, TwitterExecutor};
pub use poster::{load_credentials, post_with_stored_credentials, publish, DEFAULT_POST_TEXT};
pub use server::{AuthServer, HttpReply, ShutdownHandle};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use types::*;
