//! ============================================================================
//! Auth Flow - Authorization Code + PKCE handshake
//! ============================================================================
//! Per attempt:
//! ```text
//! Idle → AwaitingCallback ─┬─ Validated → Exchanged → Persisted
//!                          └─ Rejected
//! ```
//! A rejected attempt is gone; the browser has to start again at `/`.
//! ============================================================================

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::pkce::{generate_pkce, generate_state};
use super::session::{AuthAttempt, SessionStore};
use super::twitter_oauth::OAuthProvider;
use crate::store::CredentialStore;
use crate::types::{AuthError, CredentialBundle};

/// Where to send the browser after starting an attempt
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    pub session_id: String,
    /// True when the request carried no usable session and one was minted
    pub new_session: bool,
    pub location: String,
}

/// Query parameters delivered to `/callback`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse a raw (still percent-encoded) query string
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "state" => &mut params.state,
                "code" => &mut params.code,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        params
    }
}

/// Drives the OAuth handshake and persists the outcome
pub struct AuthFlow {
    provider: Arc<dyn OAuthProvider>,
    store: Arc<dyn CredentialStore>,
    sessions: SessionStore,
}

impl AuthFlow {
    pub fn new(
        provider: Arc<dyn OAuthProvider>,
        store: Arc<dyn CredentialStore>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            provider,
            store,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Idle → AwaitingCallback
    pub fn start(&self, session_id: Option<String>) -> AuthorizationRedirect {
        let (session_id, new_session) = match session_id {
            Some(id) => (id, false),
            None => (SessionStore::new_session_id(), true),
        };

        let pkce = generate_pkce();
        let state = generate_state();
        let location = self.provider.authorize_url(&state, &pkce.code_challenge);

        debug!("Generated state: {}", state);
        debug!("Generated codeVerifier: {}", pkce.code_verifier);

        self.sessions
            .insert(&session_id, AuthAttempt::new(state, pkce.code_verifier));

        info!("Authorization started for session {}", session_id);

        AuthorizationRedirect {
            session_id,
            new_session,
            location,
        }
    }

    /// AwaitingCallback → Persisted, or Rejected
    pub async fn complete(
        &self,
        session_id: Option<&str>,
        params: &CallbackParams,
    ) -> Result<CredentialBundle, AuthError> {
        debug!(
            "Received state from callback: {:?}, code present: {}",
            params.state,
            params.code.is_some()
        );

        if let Some(provider_error) = &params.error {
            warn!(
                "Provider returned error: {} ({})",
                provider_error,
                params.error_description.as_deref().unwrap_or("no description")
            );
        }

        let state = non_empty(&params.state).ok_or(AuthError::MissingParameter("state"))?;
        let code = non_empty(&params.code).ok_or(AuthError::MissingParameter("code"))?;

        let attempt = session_id
            .and_then(|id| self.sessions.take(id))
            .ok_or_else(|| {
                warn!("Callback without a pending authorization attempt");
                AuthError::StateMismatch
            })?;

        if attempt.state != state {
            error!(
                "State mismatch: expected {}, got {}",
                attempt.state, state
            );
            return Err(AuthError::StateMismatch);
        }

        debug!(
            "State validated, attempt age {}s",
            (chrono::Utc::now() - attempt.created_at).num_seconds()
        );

        let grant = self
            .provider
            .exchange_code(code, &attempt.code_verifier)
            .await
            .map_err(|e| {
                error!("Error during login: {}", e);
                AuthError::TokenExchange(e.to_string())
            })?;

        let user = self
            .provider
            .current_user(&grant.access_token)
            .await
            .map_err(|e| {
                error!("Failed to verify authenticated user: {}", e);
                AuthError::TokenExchange(e.to_string())
            })?;

        let bundle = CredentialBundle::from_grant(grant, user);

        self.store.save(&bundle).map_err(|e| {
            error!("Failed to save credentials: {}", e);
            AuthError::TokenExchange(e.to_string())
        })?;

        info!("Authentication successful for @{}", bundle.user.username);
        Ok(bundle)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
