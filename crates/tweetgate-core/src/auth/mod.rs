//! ============================================================================
//! Auth Module - OAuth and Authentication Flows
//! ============================================================================
//! Handles authentication against the X API:
//! - Twitter OAuth 2.0 + PKCE client
//! - Signed-cookie session store for in-flight attempts
//! - Start / callback handshake that persists the credential bundle
//! ============================================================================

mod flow;
mod pkce;
mod session;
mod twitter_oauth;

pub use flow::{AuthFlow, AuthorizationRedirect, CallbackParams};
pub use pkce::{generate_pkce, generate_state, s256_challenge, PkceCodes};
pub use session::{AuthAttempt, SessionStore, SESSION_COOKIE};
pub use twitter_oauth::{OAuthProvider, TwitterOAuth, SCOPES};
